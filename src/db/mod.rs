//! Unit-of-work boundary and the table data captured in snapshots.
//!
//! Scenarist never talks to a database directly. Callers supply a
//! [`UnitOfWork`] that owns the connection and exposes the transaction
//! primitives plus capture/restore hooks. [`MemoryDatabase`] is an in-process
//! implementation used by the bundled driver and the test suite.

mod memory;

pub use memory::MemoryDatabase;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transactional collaborator driven by the executor.
///
/// All methods return [`anyhow::Result`]; the executor wraps failures in
/// [`crate::error::ScenarioError`] with the operation that failed.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Open a transaction. Seeds run between this call and `commit`.
    async fn begin_transaction(&mut self) -> anyhow::Result<()>;

    /// Make the active transaction's changes durable.
    async fn commit(&mut self) -> anyhow::Result<()>;

    /// Discard the active transaction's changes.
    async fn rollback(&mut self) -> anyhow::Result<()>;

    /// Whether a transaction is currently open.
    fn is_active_transaction(&self) -> bool;

    /// Dump the tables affected by seeding, in a stable order.
    async fn capture(&mut self) -> anyhow::Result<DataSet>;

    /// Replace the affected tables with `data`.
    async fn restore(&mut self, data: &DataSet) -> anyhow::Result<()>;

    /// Return to the baseline state expected before the root scenario seeds.
    async fn reset(&mut self) -> anyhow::Result<()>;
}

/// Ordered collection of tables keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSet {
    tables: IndexMap<String, Table>,
}

impl DataSet {
    /// Create an empty data set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Mutable access to `name`, creating an empty table when absent.
    pub fn table_mut(&mut self, name: &str) -> &mut Table {
        self.tables.entry(name.to_owned()).or_default()
    }

    /// Insert or replace a table.
    pub fn insert_table(&mut self, name: impl Into<String>, table: Table) {
        self.tables.insert(name.into(), table);
    }

    /// Iterate tables in insertion order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the data set holds no tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Column names plus rows of cell values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column names in declaration order.
    pub columns: Vec<String>,
    /// Rows; each row has one value per column.
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Position of `column`, if present.
    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Add `column`, padding existing rows with `null`, and return its index.
    pub fn ensure_column(&mut self, column: &str) -> usize {
        if let Some(idx) = self.column_index(column) {
            return idx;
        }
        self.columns.push(column.to_owned());
        for row in &mut self.rows {
            row.push(Value::Null);
        }
        self.columns.len() - 1
    }

    /// Value of `column` in `row`, if both exist.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }
}
