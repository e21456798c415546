//! Common test utilities and mocks

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use seedkit_core::{
    CancellationToken, Deleter, DumpRow, Dumper, Inserter, NativeRow, Result, Schema, SeedError,
    Table,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Mock backend recording every call.
///
/// Each call logs `"<op>:<table>"` when it starts and `"done:<op>:<table>"`
/// when it returns successfully. Tables can be configured to fail, panic,
/// take a while, or wait on the cancellation token.
#[derive(Default)]
pub struct MockBackend {
    pub failing: HashSet<String>,
    pub panicking: HashSet<String>,
    pub delays: HashMap<String, Duration>,
    /// Tables that give up with `Cancelled` once the token fires
    pub cancellable: HashSet<String>,
    pub dumps: HashMap<String, Vec<DumpRow>>,
    pub log: Arc<Mutex<Vec<String>>>,
    pub inserted: Arc<Mutex<HashMap<String, Vec<NativeRow>>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure(mut self, table: &str) -> Self {
        self.failing.insert(table.to_string());
        self
    }

    pub fn with_panic(mut self, table: &str) -> Self {
        self.panicking.insert(table.to_string());
        self
    }

    pub fn with_delay(mut self, table: &str, millis: u64) -> Self {
        self.delays
            .insert(table.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn with_cancellable(mut self, table: &str) -> Self {
        self.cancellable.insert(table.to_string());
        self
    }

    pub fn with_dump(mut self, table: &str, rows: Vec<serde_json::Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|row| match row {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.dumps.insert(table.to_string(), rows);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Log entries for started calls only, in call order
    pub fn calls(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter(|entry| !entry.starts_with("done:"))
            .collect()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.log().iter().position(|e| e == entry)
    }

    async fn run(&self, op: &str, table: &str, cancel: &CancellationToken) -> Result<()> {
        self.log.lock().push(format!("{op}:{table}"));

        if self.panicking.contains(table) {
            panic!("mock panic in {table}");
        }

        if let Some(delay) = self.delays.get(table) {
            if self.cancellable.contains(table) {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(SeedError::Cancelled),
                    _ = tokio::time::sleep(*delay) => {}
                }
            } else {
                tokio::time::sleep(*delay).await;
            }
        }

        if self.failing.contains(table) {
            return Err(SeedError::Query(format!("{op} {table} failed")));
        }

        self.log.lock().push(format!("done:{op}:{table}"));
        Ok(())
    }
}

#[async_trait]
impl Deleter for MockBackend {
    async fn delete(&self, table: &str, cancel: &CancellationToken) -> Result<()> {
        self.run("delete", table, cancel).await
    }
}

#[async_trait]
impl Inserter for MockBackend {
    async fn insert(
        &self,
        table: &str,
        rows: &[NativeRow],
        cancel: &CancellationToken,
    ) -> Result<u64> {
        self.run("insert", table, cancel).await?;
        self.inserted
            .lock()
            .entry(table.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl Dumper for MockBackend {
    async fn dump(&self, table: &Table) -> Result<Vec<DumpRow>> {
        self.log.lock().push(format!("dump:{}", table.name));
        Ok(self.dumps.get(&table.name).cloned().unwrap_or_default())
    }
}

/// `t0` (no refs), `t1 -> t0`, `t2 -> t0`, `t3 -> [t1, t2]`
pub fn diamond_schema() -> Schema {
    Schema::builder()
        .table(
            Table::new("t0")
                .with_key_column("id", "INT64")
                .with_column("label", "STRING(MAX)"),
        )
        .table(
            Table::new("t1")
                .with_key_column("id", "INT64")
                .with_column("t0_id", "INT64"),
        )
        .table(
            Table::new("t2")
                .with_key_column("id", "INT64")
                .with_column("t0_id", "INT64"),
        )
        .table(
            Table::new("t3")
                .with_key_column("id", "INT64")
                .with_column("t1_id", "INT64")
                .with_column("t2_id", "INT64")
                .with_column("amount", "NUMERIC"),
        )
        .reference("t1", "t0")
        .reference("t2", "t0")
        .reference("t3", "t1")
        .reference("t3", "t2")
        .build()
        .expect("valid schema")
}
