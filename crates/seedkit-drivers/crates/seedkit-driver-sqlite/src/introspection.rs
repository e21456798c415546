//! Schema discovery through `sqlite_master` and the table pragmas

use rusqlite::Connection;
use seedkit_core::{Column, Result, Schema, SeedError, Table};

/// Declared type used for columns created without one (BLOB affinity)
const UNTYPED_COLUMN: &str = "BLOB";

/// Read every user table, its columns and its foreign keys
pub(crate) fn load_schema(conn: &Connection) -> Result<Schema> {
    let names = table_names(conn)?;

    let mut builder = Schema::builder();
    for name in &names {
        builder = builder.table(load_table(conn, name)?);
    }
    for name in &names {
        for target in referenced_tables(conn, name)? {
            builder = builder.reference(name.clone(), target);
        }
    }

    let schema = builder.build()?;
    tracing::debug!(tables = schema.len(), "loaded SQLite schema");
    Ok(schema)
}

fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .map_err(|e| SeedError::Schema(format!("Failed to list tables: {}", e)))?;

    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| SeedError::Schema(format!("Failed to list tables: {}", e)))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| SeedError::Schema(format!("Failed to read table name: {}", e)))?;
    Ok(names)
}

/// Columns in declaration order; key columns ordered by their `pk` ordinal
fn load_table(conn: &Connection, name: &str) -> Result<Table> {
    let sql = format!("PRAGMA table_info('{}')", escape_literal(name));
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| SeedError::Schema(format!("Failed to read columns of {}: {}", name, e)))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>("name")?,
                row.get::<_, Option<String>>("type")?,
                row.get::<_, i64>("pk")?,
            ))
        })
        .map_err(|e| SeedError::Schema(format!("Failed to read columns of {}: {}", name, e)))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| SeedError::Schema(format!("Failed to read columns of {}: {}", name, e)))?;

    let mut table = Table::new(name);
    let mut key_parts = Vec::new();
    for (position, (column, data_type, pk)) in rows.into_iter().enumerate() {
        let data_type = data_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTYPED_COLUMN.to_string());
        table.columns.push(Column::new(column, data_type));
        if pk > 0 {
            key_parts.push((pk, position));
        }
    }
    key_parts.sort_unstable();
    table.primary_key = key_parts.into_iter().map(|(_, position)| position).collect();

    Ok(table)
}

/// Tables `name` holds a foreign key into
fn referenced_tables(conn: &Connection, name: &str) -> Result<Vec<String>> {
    let sql = format!("PRAGMA foreign_key_list('{}')", escape_literal(name));
    let mut stmt = conn.prepare(&sql).map_err(|e| {
        SeedError::Schema(format!("Failed to read foreign keys of {}: {}", name, e))
    })?;

    let targets = stmt
        .query_map([], |row| row.get::<_, String>("table"))
        .map_err(|e| SeedError::Schema(format!("Failed to read foreign keys of {}: {}", name, e)))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| {
            SeedError::Schema(format!("Failed to read foreign keys of {}: {}", name, e))
        })?;
    Ok(targets)
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Quote an identifier for use in generated SQL
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
