//! Value conversion between seedkit and SQLite storage classes
//!
//! SQLite has five storage classes. Values without a direct counterpart are
//! stored as text: timestamps as RFC 3339, dates as `YYYY-MM-DD`, numerics
//! as their decimal text, and JSON, arrays and structs as JSON documents.
//! Dumped blobs come back base64 encoded so they survive the JSON fixture
//! format and coerce straight back into a `BYTES` column.

use base64::{Engine, engine::general_purpose::STANDARD};
use rusqlite::types::{Value as SqliteValue, ValueRef};
use seedkit_core::{ColumnKind, NativeValue};
use serde_json::Value as Json;

/// Convert a coerced value into the SQLite value bound for its column
pub fn native_to_sqlite(value: &NativeValue) -> SqliteValue {
    match value {
        NativeValue::Int64(Some(i)) => SqliteValue::Integer(*i),
        NativeValue::Float64(Some(f)) => SqliteValue::Real(*f),
        NativeValue::Float32(Some(f)) => SqliteValue::Real(f64::from(*f)),
        NativeValue::Bool(Some(b)) => SqliteValue::Integer(i64::from(*b)),
        NativeValue::String(Some(s)) => SqliteValue::Text(s.clone()),
        NativeValue::Bytes(Some(b)) => SqliteValue::Blob(b.clone()),
        NativeValue::Timestamp(Some(ts)) => SqliteValue::Text(ts.to_rfc3339()),
        NativeValue::Date(Some(d)) => SqliteValue::Text(d.format("%Y-%m-%d").to_string()),
        NativeValue::Numeric(Some(d)) => SqliteValue::Text(d.to_string()),
        NativeValue::Json(Some(j)) => SqliteValue::Text(j.to_string()),
        NativeValue::Array { .. } | NativeValue::Struct(_) if !value.is_null() => {
            SqliteValue::Text(native_to_json(value).to_string())
        }
        _ => SqliteValue::Null,
    }
}

/// JSON form of a native value, used for composite columns
pub fn native_to_json(value: &NativeValue) -> Json {
    match value {
        NativeValue::Int64(Some(i)) => Json::from(*i),
        NativeValue::Float64(Some(f)) => float_to_json(*f),
        NativeValue::Float32(Some(f)) => float_to_json(f64::from(*f)),
        NativeValue::Bool(Some(b)) => Json::Bool(*b),
        NativeValue::String(Some(s)) => Json::String(s.clone()),
        NativeValue::Bytes(Some(b)) => Json::String(STANDARD.encode(b)),
        NativeValue::Timestamp(Some(ts)) => Json::String(ts.to_rfc3339()),
        NativeValue::Date(Some(d)) => Json::String(d.format("%Y-%m-%d").to_string()),
        NativeValue::Numeric(Some(d)) => decimal_text_to_json(&d.to_string()),
        NativeValue::Json(Some(j)) => j.clone(),
        NativeValue::Array {
            values: Some(items),
            ..
        } => Json::Array(items.iter().map(native_to_json).collect()),
        NativeValue::Struct(Some(fields)) => Json::Object(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), native_to_json(field)))
                .collect(),
        ),
        _ => Json::Null,
    }
}

/// Convert a stored SQLite value to its fixture JSON form.
///
/// The column kind decides how ambiguous storage is read back: integers in a
/// `BOOL` column become booleans, and text in `JSON`, `ARRAY` or `STRUCT`
/// columns is parsed as a document when it is one.
pub fn sqlite_to_json(value: ValueRef<'_>, kind: &ColumnKind) -> Json {
    match value {
        ValueRef::Null => Json::Null,
        ValueRef::Integer(i) => match kind {
            ColumnKind::Bool => Json::Bool(i != 0),
            _ => Json::from(i),
        },
        ValueRef::Real(f) => float_to_json(f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            match kind {
                ColumnKind::Json | ColumnKind::Array(_) | ColumnKind::Struct(_) => {
                    serde_json::from_str(&text).unwrap_or_else(|_| Json::String(text.into_owned()))
                }
                ColumnKind::Numeric => decimal_text_to_json(&text),
                _ => Json::String(text.into_owned()),
            }
        }
        ValueRef::Blob(bytes) => Json::String(STANDARD.encode(bytes)),
    }
}

fn float_to_json(f: f64) -> Json {
    serde_json::Number::from_f64(f)
        .map(Json::Number)
        .unwrap_or(Json::Null)
}

/// Decimal text as a JSON number, keeping every digit; text that is not a
/// number stays a string
fn decimal_text_to_json(text: &str) -> Json {
    match serde_json::from_str::<Json>(text.trim()) {
        Ok(Json::Number(n)) => Json::Number(n),
        _ => Json::String(text.to_string()),
    }
}
