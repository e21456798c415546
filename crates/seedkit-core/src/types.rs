//! Core value types for seedkit

use crate::ColumnKind;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

/// A loosely typed value as it arrives in a fixture request.
///
/// Fixture files are JSON documents, so most values start life as
/// `Null`/`Bool`/`Number`/`String`/`Array`/`Object`. Programmatic callers can
/// also hand over typed values, nullable references or values that are
/// already in native form.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A JSON number literal, kept as its decimal text
    Number(serde_json::Number),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Decimal(Decimal),
    Array(Vec<InputValue>),
    Object(serde_json::Map<String, serde_json::Value>),
    /// An already-built JSON document
    Json(serde_json::Value),
    /// A nullable reference; `None` is a null pointer
    Ref(Option<Box<InputValue>>),
    /// A value that is already in backend-native form
    Native(NativeValue),
}

impl InputValue {
    /// Wrap a value in a non-null reference
    pub fn some(value: InputValue) -> Self {
        InputValue::Ref(Some(Box::new(value)))
    }

    /// Decimal text literal, as found in fixture files
    ///
    /// Returns `None` when `text` is not a valid JSON number.
    pub fn number(text: &str) -> Option<Self> {
        text.parse::<serde_json::Number>().ok().map(InputValue::Number)
    }

    /// Short name of the value's shape, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            InputValue::Null => "null",
            InputValue::Bool(_) => "bool",
            InputValue::Int(_) => "integer",
            InputValue::Float(_) => "float",
            InputValue::Number(_) => "number",
            InputValue::String(_) => "string",
            InputValue::Bytes(_) => "bytes",
            InputValue::Timestamp(_) => "timestamp",
            InputValue::Date(_) => "date",
            InputValue::Decimal(_) => "decimal",
            InputValue::Array(_) => "array",
            InputValue::Object(_) => "object",
            InputValue::Json(_) => "json",
            InputValue::Ref(_) => "reference",
            InputValue::Native(_) => "native",
        }
    }

    /// Convert to a JSON document, if the value has a JSON shape
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value as Json;

        Some(match self {
            InputValue::Null | InputValue::Ref(None) => Json::Null,
            InputValue::Bool(b) => Json::Bool(*b),
            InputValue::Int(i) => Json::Number((*i).into()),
            InputValue::Float(f) => Json::Number(serde_json::Number::from_f64(*f)?),
            InputValue::Number(n) => Json::Number(n.clone()),
            InputValue::String(s) => Json::String(s.clone()),
            InputValue::Timestamp(ts) => Json::String(ts.to_rfc3339()),
            InputValue::Date(d) => Json::String(d.to_string()),
            InputValue::Decimal(d) => Json::Number(d.to_string().parse().ok()?),
            InputValue::Array(items) => Json::Array(
                items
                    .iter()
                    .map(InputValue::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            InputValue::Object(map) => Json::Object(map.clone()),
            InputValue::Json(value) => value.clone(),
            InputValue::Ref(Some(inner)) => inner.to_json()?,
            InputValue::Bytes(_) | InputValue::Native(_) => return None,
        })
    }
}

impl From<serde_json::Value> for InputValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => InputValue::Null,
            serde_json::Value::Bool(b) => InputValue::Bool(b),
            serde_json::Value::Number(n) => InputValue::Number(n),
            serde_json::Value::String(s) => InputValue::String(s),
            serde_json::Value::Array(items) => {
                InputValue::Array(items.into_iter().map(InputValue::from).collect())
            }
            serde_json::Value::Object(map) => InputValue::Object(map),
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Null | InputValue::Ref(None) => write!(f, "null"),
            InputValue::Bool(v) => write!(f, "{}", v),
            InputValue::Int(v) => write!(f, "{}", v),
            InputValue::Float(v) => write!(f, "{}", v),
            InputValue::Number(v) => write!(f, "{}", v),
            InputValue::String(v) => write!(f, "{:?}", v),
            InputValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            InputValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            InputValue::Date(v) => write!(f, "{}", v),
            InputValue::Decimal(v) => write!(f, "{}", v),
            InputValue::Array(v) => write!(f, "[{} items]", v.len()),
            InputValue::Object(v) => write!(f, "{{{} fields}}", v.len()),
            InputValue::Json(v) => write!(f, "{}", v),
            InputValue::Ref(Some(v)) => write!(f, "&{}", v),
            InputValue::Native(v) => write!(f, "{}", v),
        }
    }
}

/// A null-aware value in the form a backend stores for a column.
///
/// Every variant carries an `Option`; `None` is SQL NULL for that kind.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Int64(Option<i64>),
    Float64(Option<f64>),
    Float32(Option<f32>),
    Bool(Option<bool>),
    String(Option<String>),
    Bytes(Option<Vec<u8>>),
    Timestamp(Option<DateTime<Utc>>),
    Date(Option<NaiveDate>),
    Numeric(Option<Decimal>),
    Json(Option<serde_json::Value>),
    Array {
        element: ColumnKind,
        values: Option<Vec<NativeValue>>,
    },
    Struct(Option<Vec<(String, NativeValue)>>),
}

impl NativeValue {
    /// The null value for a column kind.
    ///
    /// `None` for unsupported kinds, which have no native representation.
    pub fn null_of(kind: &ColumnKind) -> Option<Self> {
        Some(match kind {
            ColumnKind::Int64 => NativeValue::Int64(None),
            ColumnKind::Float64 => NativeValue::Float64(None),
            ColumnKind::Float32 => NativeValue::Float32(None),
            ColumnKind::Bool => NativeValue::Bool(None),
            ColumnKind::String => NativeValue::String(None),
            ColumnKind::Bytes => NativeValue::Bytes(None),
            ColumnKind::Timestamp => NativeValue::Timestamp(None),
            ColumnKind::Date => NativeValue::Date(None),
            ColumnKind::Numeric => NativeValue::Numeric(None),
            ColumnKind::Json => NativeValue::Json(None),
            ColumnKind::Array(element) if element.is_supported() => NativeValue::Array {
                element: (**element).clone(),
                values: None,
            },
            ColumnKind::Struct(_) => NativeValue::Struct(None),
            ColumnKind::Array(_) | ColumnKind::Unsupported(_) => return None,
        })
    }

    pub fn is_null(&self) -> bool {
        match self {
            NativeValue::Int64(v) => v.is_none(),
            NativeValue::Float64(v) => v.is_none(),
            NativeValue::Float32(v) => v.is_none(),
            NativeValue::Bool(v) => v.is_none(),
            NativeValue::String(v) => v.is_none(),
            NativeValue::Bytes(v) => v.is_none(),
            NativeValue::Timestamp(v) => v.is_none(),
            NativeValue::Date(v) => v.is_none(),
            NativeValue::Numeric(v) => v.is_none(),
            NativeValue::Json(v) => v.is_none(),
            NativeValue::Array { values, .. } => values.is_none(),
            NativeValue::Struct(v) => v.is_none(),
        }
    }

    /// Whether this value is a valid representation for `kind`
    pub fn matches_kind(&self, kind: &ColumnKind) -> bool {
        matches!(
            (self, kind),
            (NativeValue::Int64(_), ColumnKind::Int64)
                | (NativeValue::Float64(_), ColumnKind::Float64)
                | (NativeValue::Float32(_), ColumnKind::Float32)
                | (NativeValue::Bool(_), ColumnKind::Bool)
                | (NativeValue::String(_), ColumnKind::String)
                | (NativeValue::Bytes(_), ColumnKind::Bytes)
                | (NativeValue::Timestamp(_), ColumnKind::Timestamp)
                | (NativeValue::Date(_), ColumnKind::Date)
                | (NativeValue::Numeric(_), ColumnKind::Numeric)
                | (NativeValue::Json(_), ColumnKind::Json)
                | (NativeValue::Struct(_), ColumnKind::Struct(_))
        ) || match (self, kind) {
            (NativeValue::Array { element, .. }, ColumnKind::Array(expected)) => {
                element == expected.as_ref()
            }
            _ => false,
        }
    }

    /// The column kind this value belongs to
    pub fn kind_name(&self) -> String {
        match self {
            NativeValue::Int64(_) => ColumnKind::Int64.to_string(),
            NativeValue::Float64(_) => ColumnKind::Float64.to_string(),
            NativeValue::Float32(_) => ColumnKind::Float32.to_string(),
            NativeValue::Bool(_) => ColumnKind::Bool.to_string(),
            NativeValue::String(_) => ColumnKind::String.to_string(),
            NativeValue::Bytes(_) => ColumnKind::Bytes.to_string(),
            NativeValue::Timestamp(_) => ColumnKind::Timestamp.to_string(),
            NativeValue::Date(_) => ColumnKind::Date.to_string(),
            NativeValue::Numeric(_) => ColumnKind::Numeric.to_string(),
            NativeValue::Json(_) => ColumnKind::Json.to_string(),
            NativeValue::Array { element, .. } => format!("ARRAY<{}>", element),
            NativeValue::Struct(_) => "STRUCT".to_string(),
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "NULL::{}", self.kind_name());
        }
        match self {
            NativeValue::Int64(Some(v)) => write!(f, "{}", v),
            NativeValue::Float64(Some(v)) => write!(f, "{}", v),
            NativeValue::Float32(Some(v)) => write!(f, "{}", v),
            NativeValue::Bool(Some(v)) => write!(f, "{}", v),
            NativeValue::String(Some(v)) => write!(f, "{:?}", v),
            NativeValue::Bytes(Some(v)) => write!(f, "<{} bytes>", v.len()),
            NativeValue::Timestamp(Some(v)) => write!(f, "{}", v.to_rfc3339()),
            NativeValue::Date(Some(v)) => write!(f, "{}", v),
            NativeValue::Numeric(Some(v)) => write!(f, "{}", v),
            NativeValue::Json(Some(v)) => write!(f, "{}", v),
            NativeValue::Array {
                values: Some(v), ..
            } => write!(f, "[{} items]", v.len()),
            NativeValue::Struct(Some(v)) => write!(f, "({} fields)", v.len()),
            _ => Ok(()),
        }
    }
}

/// A fixture row: column name to loosely typed value
pub type FixtureRow = BTreeMap<String, InputValue>;

/// A coerced row, ready for an [`Inserter`](crate::Inserter)
pub type NativeRow = BTreeMap<String, NativeValue>;

/// A row read back from a backend, in fixture-compatible JSON form
pub type DumpRow = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_numbers_keep_decimal_text() {
        let value: serde_json::Value =
            serde_json::from_str("12345678901234567890.000000001").unwrap();
        match InputValue::from(value) {
            InputValue::Number(n) => assert_eq!(n.to_string(), "12345678901234567890.000000001"),
            other => panic!("expected number, got {:?}", other),
        }
    }

    #[test]
    fn test_null_of_every_supported_kind_is_null() {
        let kinds = [
            ColumnKind::Int64,
            ColumnKind::Float64,
            ColumnKind::Float32,
            ColumnKind::Bool,
            ColumnKind::String,
            ColumnKind::Bytes,
            ColumnKind::Timestamp,
            ColumnKind::Date,
            ColumnKind::Numeric,
            ColumnKind::Json,
            ColumnKind::Array(Box::new(ColumnKind::Int64)),
            ColumnKind::Struct("a INT64".into()),
        ];
        for kind in kinds {
            let null = NativeValue::null_of(&kind).expect("supported kind");
            assert!(null.is_null(), "{} null should be null", kind);
            assert!(null.matches_kind(&kind), "{} null should match its kind", kind);
        }
        assert!(NativeValue::null_of(&ColumnKind::Unsupported("GEOGRAPHY".into())).is_none());
    }

    #[test]
    fn test_array_matches_only_its_element_kind() {
        let value = NativeValue::Array {
            element: ColumnKind::Int64,
            values: Some(vec![NativeValue::Int64(Some(1))]),
        };
        assert!(value.matches_kind(&ColumnKind::Array(Box::new(ColumnKind::Int64))));
        assert!(!value.matches_kind(&ColumnKind::Array(Box::new(ColumnKind::String))));
        assert!(!value.matches_kind(&ColumnKind::Int64));
    }

    #[test]
    fn test_input_to_json() {
        let input = InputValue::Array(vec![
            InputValue::Int(1),
            InputValue::String("a".into()),
            InputValue::some(InputValue::Bool(true)),
        ]);
        assert_eq!(input.to_json(), Some(serde_json::json!([1, "a", true])));
        assert_eq!(InputValue::Bytes(vec![1]).to_json(), None);
    }
}
