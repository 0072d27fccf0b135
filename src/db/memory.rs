//! In-memory [`UnitOfWork`] with copy-on-begin transactions.

use anyhow::{Result, anyhow, bail, ensure};
use async_trait::async_trait;
use serde_json::Value;

use super::{DataSet, Table, UnitOfWork};

/// Column treated as a primary key when present.
const KEY_COLUMN: &str = "id";

/// Process-local database holding [`DataSet`] tables.
///
/// Writes are only accepted inside a transaction. Beginning a transaction
/// copies the committed tables; rollback drops the copy. Rows carrying an
/// `id` column must keep it unique within their table.
///
/// # Examples
///
/// ```
/// use scenarist::db::{MemoryDatabase, UnitOfWork};
/// use serde_json::json;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut db = MemoryDatabase::new();
/// db.begin_transaction().await?;
/// db.insert("roles", [("id", json!(1)), ("name", json!("admin"))])?;
/// db.commit().await?;
/// assert_eq!(db.row_count("roles"), 1);
/// # Ok::<(), anyhow::Error>(())
/// # }).unwrap();
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryDatabase {
    committed: DataSet,
    pending: Option<DataSet>,
}

impl MemoryDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one row into `table`, creating the table and columns as needed.
    ///
    /// # Errors
    ///
    /// Fails when no transaction is active or the row repeats an existing
    /// `id` value.
    pub fn insert<'a, I>(&mut self, table: &str, row: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let data = self
            .pending
            .as_mut()
            .ok_or_else(|| anyhow!("insert into '{table}' outside a transaction"))?;
        let target = data.table_mut(table);
        let cells: Vec<(&str, Value)> = row.into_iter().collect();
        if let Some((_, key)) = cells.iter().find(|(column, _)| *column == KEY_COLUMN) {
            ensure!(
                !contains_key(target, key),
                "duplicate {KEY_COLUMN} {key} in table '{table}'"
            );
        }
        let mut values = vec![Value::Null; target.columns.len()];
        for (column, value) in cells {
            let idx = target.ensure_column(column);
            if values.len() <= idx {
                values.resize(idx + 1, Value::Null);
            }
            if let Some(slot) = values.get_mut(idx) {
                *slot = value;
            }
        }
        target.rows.push(values);
        Ok(())
    }

    /// The tables visible to the caller: pending changes when a transaction
    /// is open, committed data otherwise.
    #[must_use]
    pub fn view(&self) -> &DataSet {
        self.pending.as_ref().unwrap_or(&self.committed)
    }

    /// Number of visible rows in `table`.
    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.view().table(table).map_or(0, |t| t.rows.len())
    }
}

fn contains_key(table: &Table, key: &Value) -> bool {
    table.column_index(KEY_COLUMN).is_some_and(|idx| {
        table
            .rows
            .iter()
            .any(|row| row.get(idx).is_some_and(|cell| cell == key))
    })
}

#[async_trait]
impl UnitOfWork for MemoryDatabase {
    async fn begin_transaction(&mut self) -> Result<()> {
        if self.pending.is_some() {
            bail!("a transaction is already active");
        }
        self.pending = Some(self.committed.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| anyhow!("commit without an active transaction"))?;
        self.committed = pending;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.pending
            .take()
            .map(drop)
            .ok_or_else(|| anyhow!("rollback without an active transaction"))
    }

    fn is_active_transaction(&self) -> bool {
        self.pending.is_some()
    }

    async fn capture(&mut self) -> Result<DataSet> {
        ensure!(self.pending.is_none(), "cannot capture during a transaction");
        Ok(self.committed.clone())
    }

    async fn restore(&mut self, data: &DataSet) -> Result<()> {
        ensure!(self.pending.is_none(), "cannot restore during a transaction");
        self.committed = data.clone();
        Ok(())
    }

    async fn reset(&mut self) -> Result<()> {
        ensure!(self.pending.is_none(), "cannot reset during a transaction");
        self.committed = DataSet::new();
        Ok(())
    }
}
