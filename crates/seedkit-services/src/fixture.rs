//! Fixture document format
//!
//! A fixture is a JSON array of tables, each with the rows to seed:
//!
//! ```json
//! [
//!   { "name": "customers", "rows": [ { "id": 1, "name": "Ada" } ] },
//!   { "name": "orders", "rows": [ { "id": 10, "customer_id": 1, "total": 12.50 } ] }
//! ]
//! ```
//!
//! Numbers keep their decimal text until coercion, so `12.50` reaches a
//! `NUMERIC` column exactly.

use crate::{ServiceError, ServiceResult};
use seedkit_core::{DumpRow, FixtureRow, InputValue, SeedError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The rows of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureTable {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<DumpRow>,
}

impl FixtureTable {
    pub fn new(name: impl Into<String>, rows: Vec<DumpRow>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Rows as loosely typed fixture values
    pub fn fixture_rows(&self) -> Vec<FixtureRow> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(column, value)| (column.clone(), InputValue::from(value.clone())))
                    .collect()
            })
            .collect()
    }
}

/// An ordered list of fixture tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureDocument {
    pub tables: Vec<FixtureTable>,
}

impl FixtureDocument {
    pub fn new(tables: Vec<FixtureTable>) -> Self {
        Self { tables }
    }

    pub fn from_json(json: &str) -> ServiceResult<Self> {
        serde_json::from_str(json).map_err(|e| ServiceError::InvalidFixture(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(SeedError::from)?;
        Self::from_json(&json).map_err(|e| match e {
            ServiceError::InvalidFixture(reason) => {
                ServiceError::InvalidFixture(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    pub fn to_json_pretty(&self) -> ServiceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ServiceError::Backend(e.into()))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const FIXTURE: &str = r#"[
        {"name": "customers", "rows": [{"id": 1, "name": "Ada"}]},
        {"name": "orders", "rows": [{"id": 10, "total": 12.50}, {"id": 11, "total": null}]},
        {"name": "empty"}
    ]"#;

    #[test]
    fn test_parse_fixture() {
        let doc = FixtureDocument::from_json(FIXTURE).unwrap();
        assert_eq!(doc.table_names(), vec!["customers", "orders", "empty"]);
        assert_eq!(doc.tables[1].rows.len(), 2);
        assert!(doc.tables[2].rows.is_empty());
    }

    #[test]
    fn test_numbers_keep_decimal_text() {
        let doc = FixtureDocument::from_json(FIXTURE).unwrap();
        let rows = doc.tables[1].fixture_rows();
        match &rows[0]["total"] {
            InputValue::Number(n) => assert_eq!(n.to_string(), "12.50"),
            other => panic!("expected number, got {:?}", other),
        }
        assert_eq!(rows[1]["total"], InputValue::Null);
    }

    #[test]
    fn test_rejects_non_array_document() {
        let err = FixtureDocument::from_json(r#"{"name": "customers"}"#).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidFixture(_)));
    }

    #[test]
    fn test_from_path_and_pretty_output() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let doc = FixtureDocument::from_path(file.path()).unwrap();
        let reparsed = FixtureDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn test_from_missing_path() {
        let err = FixtureDocument::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ServiceError::Backend(SeedError::Io(_))));
    }
}
