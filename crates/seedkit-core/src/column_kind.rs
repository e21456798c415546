//! Column kinds
//!
//! Backends describe column types as strings (`INT64`, `STRING(MAX)`,
//! `ARRAY<INT64>`, `VARCHAR(255)`, ...). Everything downstream works on the
//! closed [`ColumnKind`] enum parsed from those descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of value a column stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Signed 64-bit integer (`INT64`, `INTEGER`, `BIGINT`, ...)
    Int64,
    /// Double precision float (`FLOAT64`, `REAL`, `DOUBLE`)
    Float64,
    /// Single precision float (`FLOAT32`)
    Float32,
    /// Boolean (`BOOL`, `BOOLEAN`)
    Bool,
    /// Text (`STRING(MAX)`, `TEXT`, `VARCHAR(n)`)
    String,
    /// Raw bytes (`BYTES(n)`, `BLOB`)
    Bytes,
    /// Point in time, UTC (`TIMESTAMP`, `DATETIME`)
    Timestamp,
    /// Calendar date (`DATE`)
    Date,
    /// Exact fixed-point number (`NUMERIC`, `DECIMAL(p, s)`)
    Numeric,
    /// JSON document (`JSON`, `JSONB`)
    Json,
    /// Homogeneous array of the element kind (`ARRAY<...>`)
    Array(Box<ColumnKind>),
    /// Composite record; the field list is kept verbatim (`STRUCT<...>`)
    Struct(String),
    /// A descriptor no kind matched
    Unsupported(String),
}

impl ColumnKind {
    /// Parse a backend type descriptor.
    ///
    /// Matching is case-insensitive. Wrapper types (`ARRAY<...>`, `STRUCT<...>`)
    /// are recognised first, then the base name in front of any length or
    /// precision suffix. Names outside the known set fall back to SQLite's
    /// type-affinity rules.
    pub fn parse(descriptor: &str) -> Self {
        let trimmed = descriptor.trim();

        if let Some(inner) = strip_wrapper(trimmed, "ARRAY") {
            return ColumnKind::Array(Box::new(Self::parse(inner)));
        }
        if let Some(inner) = strip_wrapper(trimmed, "STRUCT") {
            return ColumnKind::Struct(inner.trim().to_string());
        }

        let upper = trimmed.to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or_default().trim();
        let head = base.split_whitespace().next().unwrap_or_default();

        match head {
            "INT64" | "INTEGER" | "INT" | "BIGINT" | "SMALLINT" | "TINYINT" | "MEDIUMINT"
            | "INT2" | "INT8" => ColumnKind::Int64,
            "FLOAT64" | "DOUBLE" | "REAL" | "FLOAT" | "FLOAT8" => ColumnKind::Float64,
            "FLOAT32" | "FLOAT4" => ColumnKind::Float32,
            "BOOL" | "BOOLEAN" => ColumnKind::Bool,
            "STRING" | "TEXT" | "VARCHAR" | "CHAR" | "CHARACTER" | "NCHAR" | "NVARCHAR"
            | "CLOB" | "UUID" => ColumnKind::String,
            "BYTES" | "BLOB" | "BYTEA" | "VARBINARY" | "BINARY" => ColumnKind::Bytes,
            "TIMESTAMP" | "TIMESTAMPTZ" | "DATETIME" => ColumnKind::Timestamp,
            "DATE" => ColumnKind::Date,
            "NUMERIC" | "DECIMAL" => ColumnKind::Numeric,
            "JSON" | "JSONB" => ColumnKind::Json,
            _ => affinity(&upper).unwrap_or_else(|| ColumnKind::Unsupported(trimmed.to_string())),
        }
    }

    /// Element kind of an array column
    pub fn element(&self) -> Option<&ColumnKind> {
        match self {
            ColumnKind::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        match self {
            ColumnKind::Unsupported(_) => false,
            ColumnKind::Array(element) => element.is_supported(),
            _ => true,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Int64 => write!(f, "INT64"),
            ColumnKind::Float64 => write!(f, "FLOAT64"),
            ColumnKind::Float32 => write!(f, "FLOAT32"),
            ColumnKind::Bool => write!(f, "BOOL"),
            ColumnKind::String => write!(f, "STRING"),
            ColumnKind::Bytes => write!(f, "BYTES"),
            ColumnKind::Timestamp => write!(f, "TIMESTAMP"),
            ColumnKind::Date => write!(f, "DATE"),
            ColumnKind::Numeric => write!(f, "NUMERIC"),
            ColumnKind::Json => write!(f, "JSON"),
            ColumnKind::Array(element) => write!(f, "ARRAY<{}>", element),
            ColumnKind::Struct(fields) => write!(f, "STRUCT<{}>", fields),
            ColumnKind::Unsupported(raw) => write!(f, "{}", raw),
        }
    }
}

/// `NAME<inner>` with a case-insensitive name; returns `inner`.
fn strip_wrapper<'a>(descriptor: &'a str, name: &str) -> Option<&'a str> {
    let prefix = descriptor.get(..name.len())?;
    if !prefix.eq_ignore_ascii_case(name) {
        return None;
    }
    descriptor[name.len()..]
        .trim_start()
        .strip_prefix('<')?
        .strip_suffix('>')
}

/// SQLite column affinity (https://www.sqlite.org/datatype3.html, section 3.1).
fn affinity(upper: &str) -> Option<ColumnKind> {
    if upper.contains("INT") {
        Some(ColumnKind::Int64)
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        Some(ColumnKind::String)
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        Some(ColumnKind::Float64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_distributed_sql_types() {
        assert_eq!(ColumnKind::parse("INT64"), ColumnKind::Int64);
        assert_eq!(ColumnKind::parse("STRING(MAX)"), ColumnKind::String);
        assert_eq!(ColumnKind::parse("BYTES(16)"), ColumnKind::Bytes);
        assert_eq!(ColumnKind::parse("FLOAT32"), ColumnKind::Float32);
        assert_eq!(ColumnKind::parse("NUMERIC"), ColumnKind::Numeric);
        assert_eq!(ColumnKind::parse("JSON"), ColumnKind::Json);
    }

    #[test]
    fn test_parse_embedded_sql_types() {
        assert_eq!(ColumnKind::parse("integer"), ColumnKind::Int64);
        assert_eq!(ColumnKind::parse("VARCHAR(255)"), ColumnKind::String);
        assert_eq!(ColumnKind::parse("double precision"), ColumnKind::Float64);
        assert_eq!(ColumnKind::parse("DECIMAL(10, 2)"), ColumnKind::Numeric);
        assert_eq!(ColumnKind::parse("datetime"), ColumnKind::Timestamp);
        assert_eq!(ColumnKind::parse("BLOB"), ColumnKind::Bytes);
    }

    #[test]
    fn test_parse_arrays_recursively() {
        assert_eq!(
            ColumnKind::parse("ARRAY<INT64>"),
            ColumnKind::Array(Box::new(ColumnKind::Int64))
        );
        assert_eq!(
            ColumnKind::parse("array<STRING(MAX)>"),
            ColumnKind::Array(Box::new(ColumnKind::String))
        );
        assert_eq!(
            ColumnKind::parse("ARRAY<STRUCT<a INT64, b STRING(MAX)>>"),
            ColumnKind::Array(Box::new(ColumnKind::Struct("a INT64, b STRING(MAX)".into())))
        );
    }

    #[test]
    fn test_parse_falls_back_to_affinity() {
        assert_eq!(ColumnKind::parse("UNSIGNED BIG INT"), ColumnKind::Int64);
        assert_eq!(ColumnKind::parse("NATIVE CHARACTER(70)"), ColumnKind::String);
        assert_eq!(
            ColumnKind::parse("GEOGRAPHY"),
            ColumnKind::Unsupported("GEOGRAPHY".into())
        );
        assert!(!ColumnKind::parse("ARRAY<GEOGRAPHY>").is_supported());
    }

    #[test]
    fn test_display_uses_canonical_names() {
        assert_eq!(ColumnKind::parse("bigint").to_string(), "INT64");
        assert_eq!(ColumnKind::parse("ARRAY<text>").to_string(), "ARRAY<STRING>");
    }
}
