//! SQLite backend implementation

use crate::introspection::{load_schema, quote_ident};
use crate::values::{native_to_sqlite, sqlite_to_json};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags, params_from_iter};
use seedkit_core::{
    CancellationToken, Deleter, DumpRow, Dumper, Inserter, NativeRow, Result, Schema,
    SchemaFetcher, SeedError, Table,
};
use std::path::PathBuf;
use std::sync::Arc;

/// SQLite database shared by every collaborator role.
///
/// Statements run one at a time on a single connection; concurrent units of
/// a batch queue up on the connection lock.
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<RusqliteConnection>>,
}

impl SqliteBackend {
    /// Open (or create) a SQLite database file. `:memory:` opens a private
    /// in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        tracing::info!(path = %path, "opening SQLite database");
        if path == ":memory:" {
            return Self::open_in_memory();
        }

        let expanded = expand_path(path)?;
        if let Some(parent) = expanded.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            return Err(SeedError::Connection(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = RusqliteConnection::open_with_flags(&expanded, flags).map_err(|e| {
            SeedError::Connection(format!(
                "Failed to open SQLite database at '{}': {}",
                expanded.display(),
                e
            ))
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| SeedError::Connection(format!("Failed to set journal mode: {}", e)))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| SeedError::Connection(format!("Failed to set synchronous mode: {}", e)))?;

        let backend = Self::from_connection(conn)?;
        tracing::info!(path = %expanded.display(), "SQLite database connection established");
        Ok(backend)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = RusqliteConnection::open_in_memory().map_err(|e| {
            SeedError::Connection(format!("Failed to open in-memory database: {}", e))
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: RusqliteConnection) -> Result<Self> {
        // Deletes and inserts must respect references, so enforcement is not optional
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| SeedError::Connection(format!("Failed to enable foreign keys: {}", e)))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a script of SQL statements, e.g. a schema migration
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!("executing SQL batch");
        self.conn
            .lock()
            .execute_batch(sql)
            .map_err(|e| SeedError::Query(format!("Failed to execute batch: {}", e)))
    }

    /// Number of rows currently in `table`
    pub fn row_count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        self.conn
            .lock()
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| SeedError::Query(format!("Failed to count rows of {}: {}", table, e)))
    }
}

#[async_trait]
impl Deleter for SqliteBackend {
    async fn delete(&self, table: &str, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(SeedError::Cancelled);
        }

        let sql = format!("DELETE FROM {}", quote_ident(table));
        let deleted = self
            .conn
            .lock()
            .execute(&sql, [])
            .map_err(|e| SeedError::Query(format!("Failed to delete from {}: {}", table, e)))?;

        tracing::debug!(table = %table, rows = deleted, "deleted table rows");
        Ok(())
    }
}

#[async_trait]
impl Inserter for SqliteBackend {
    /// Inserts all rows in one transaction; nothing is written if any row
    /// fails or the batch is cancelled part way.
    async fn insert(
        &self,
        table: &str,
        rows: &[NativeRow],
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| SeedError::Query(format!("Failed to begin transaction: {}", e)))?;

        let target = quote_ident(table);
        let mut written = 0u64;
        for row in rows {
            if cancel.is_cancelled() {
                return Err(SeedError::Cancelled);
            }

            let sql = if row.is_empty() {
                format!("INSERT INTO {} DEFAULT VALUES", target)
            } else {
                let columns: Vec<String> = row.keys().map(|c| quote_ident(c)).collect();
                let placeholders = vec!["?"; row.len()].join(", ");
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    target,
                    columns.join(", "),
                    placeholders
                )
            };

            let mut stmt = tx
                .prepare_cached(&sql)
                .map_err(|e| SeedError::Query(format!("Failed to prepare insert: {}", e)))?;
            stmt.execute(params_from_iter(row.values().map(native_to_sqlite)))
                .map_err(|e| SeedError::Query(format!("Failed to insert into {}: {}", table, e)))?;
            written += 1;
        }

        tx.commit()
            .map_err(|e| SeedError::Query(format!("Failed to commit insert: {}", e)))?;
        tracing::debug!(table = %table, rows = written, "inserted table rows");
        Ok(written)
    }
}

#[async_trait]
impl SchemaFetcher for SqliteBackend {
    async fn fetch_schema(&self) -> Result<Schema> {
        load_schema(&self.conn.lock())
    }
}

#[async_trait]
impl Dumper for SqliteBackend {
    async fn dump(&self, table: &Table) -> Result<Vec<DumpRow>> {
        let order_by = if table.primary_key.is_empty() {
            "rowid".to_string()
        } else {
            table
                .primary_key_columns()
                .map(|c| quote_ident(&c.name))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let columns = table
            .columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            columns,
            quote_ident(&table.name),
            order_by
        );

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| SeedError::Query(format!("Failed to read {}: {}", table.name, e)))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| SeedError::Query(format!("Failed to read {}: {}", table.name, e)))?;

        let mut dumped = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| SeedError::Query(format!("Failed to fetch row: {}", e)))?
        {
            let mut record = DumpRow::new();
            for (idx, column) in table.columns.iter().enumerate() {
                let value = row
                    .get_ref(idx)
                    .map_err(|e| SeedError::Query(e.to_string()))?;
                record.insert(column.name.clone(), sqlite_to_json(value, &column.kind));
            }
            dumped.push(record);
        }

        Ok(dumped)
    }
}

/// Expand `~/` to the home directory and make relative paths absolute
fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .ok_or_else(|| SeedError::Configuration("Unable to determine HOME directory".into()))?
            .join(rest)
    } else if path.starts_with('~') {
        return Err(SeedError::Configuration(
            "User-specific home directories (~user) are not supported".into(),
        ));
    } else {
        PathBuf::from(path)
    };

    if expanded.is_relative() {
        Ok(std::env::current_dir()?.join(expanded))
    } else {
        Ok(expanded)
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend").finish_non_exhaustive()
    }
}
