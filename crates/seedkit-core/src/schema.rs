//! Schema model
//!
//! A [`Schema`] is fetched once per invocation and never mutated afterwards.
//! Tables are addressed by their index in [`Schema::tables`]; the reference
//! graph uses the same indices.

use crate::{ColumnKind, Result, SeedError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a table within its schema
pub type TableIndex = usize;

/// A table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Backend type descriptor, e.g. `STRING(MAX)`
    pub data_type: String,
    /// Parsed kind of `data_type`
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        let data_type = data_type.into();
        Self {
            name: name.into(),
            kind: ColumnKind::parse(&data_type),
            data_type,
        }
    }
}

/// A table and its columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    /// Primary key column indices, in key order
    pub primary_key: Vec<usize>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    /// Add a column
    pub fn with_column(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.columns.push(Column::new(name, data_type));
        self
    }

    /// Add a column that is also the next primary key part
    pub fn with_key_column(
        mut self,
        name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        self.primary_key.push(self.columns.len());
        self.columns.push(Column::new(name, data_type));
        self
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary key columns, in key order
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.primary_key.iter().filter_map(|&i| self.columns.get(i))
    }
}

/// Read-only schema view: tables plus the table reference graph.
///
/// `references()[i]` lists the tables that table `i` holds a foreign key
/// into (or is interleaved in). Rows of `i` cannot exist without rows in
/// those tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    tables: Vec<Table>,
    references: Vec<Vec<TableIndex>>,
    by_name: HashMap<String, TableIndex>,
}

impl Schema {
    /// Build a schema, validating the reference graph shape.
    ///
    /// Fails when `references` does not have one entry per table, when an
    /// edge points outside the table list, or when table names repeat.
    pub fn new(tables: Vec<Table>, references: Vec<Vec<TableIndex>>) -> Result<Self> {
        if references.len() != tables.len() {
            return Err(SeedError::Schema(format!(
                "reference graph has {} entries for {} tables",
                references.len(),
                tables.len()
            )));
        }

        for (from, edges) in references.iter().enumerate() {
            if let Some(&bad) = edges.iter().find(|&&to| to >= tables.len()) {
                return Err(SeedError::Schema(format!(
                    "table '{}' references unknown table index {}",
                    tables[from].name, bad
                )));
            }
        }

        let mut by_name = HashMap::with_capacity(tables.len());
        for (index, table) in tables.iter().enumerate() {
            if by_name.insert(table.name.clone(), index).is_some() {
                return Err(SeedError::Schema(format!(
                    "duplicate table name '{}'",
                    table.name
                )));
            }
        }

        Ok(Self {
            tables,
            references,
            by_name,
        })
    }

    /// Start building a schema by table name
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn references(&self) -> &[Vec<TableIndex>] {
        &self.references
    }

    pub fn table(&self, index: TableIndex) -> Option<&Table> {
        self.tables.get(index)
    }

    pub fn table_index(&self, name: &str) -> Option<TableIndex> {
        self.by_name.get(name).copied()
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.table_index(name).and_then(|i| self.tables.get(i))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Builds a [`Schema`] from tables and name-based references.
///
/// Self-references are dropped; they never constrain the order between
/// two different tables.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: Vec<Table>,
    references: Vec<(String, String)>,
}

impl SchemaBuilder {
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Record that `from` references `to`
    pub fn reference(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.references.push((from.into(), to.into()));
        self
    }

    pub fn build(self) -> Result<Schema> {
        let index: HashMap<&str, TableIndex> = self
            .tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.as_str(), i))
            .collect();

        let mut references = vec![Vec::new(); self.tables.len()];
        for (from, to) in &self.references {
            let from_idx = *index
                .get(from.as_str())
                .ok_or_else(|| SeedError::Schema(format!("unknown table '{}'", from)))?;
            let to_idx = *index.get(to.as_str()).ok_or_else(|| {
                SeedError::Schema(format!("table '{}' references unknown table '{}'", from, to))
            })?;
            if from_idx != to_idx && !references[from_idx].contains(&to_idx) {
                references[from_idx].push(to_idx);
            }
        }

        Schema::new(self.tables, references)
    }
}
