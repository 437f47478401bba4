//! Driver-facing connection traits.
//!
//! The engine never talks to a database library directly; it consumes a
//! connection handed to it per call through these traits. A driver
//! implements [`Connection`], [`Statement`], [`Rows`] and [`RawBatch`],
//! and a [`ConnectionProvider`] hands connections out and takes them
//! back. Statements borrow the connection shared, so a batch loop can
//! commit through the connection while its prepared statement is alive.
//!
//! Resource discipline: statements and cursors are closed by dropping
//! them; every `Box` returned here releases its driver resources in
//! `Drop`, so cleanup happens on every exit path without explicit close
//! calls.

use crate::error::DbResult;
use crate::models::value::Value;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::VecDeque;

/// How generated keys will be read back after an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRetrieval {
    /// Plain statement, no key retrieval.
    None,
    /// Ask the driver for its generated keys (auto-increment style).
    Generated,
    /// Name the key columns up front at prepare time (sequence-style
    /// dialects require this).
    Named(Vec<String>),
}

/// A single database connection, scoped to one top-level engine call.
///
/// Implementations use interior mutability: statements hold a shared
/// borrow of the connection, and `commit`/`set_autocommit` also take
/// `&self` so they can interleave with an open statement.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Prepare a parameterized statement.
    async fn prepare(
        &self,
        sql: &str,
        keys: KeyRetrieval,
    ) -> DbResult<Box<dyn Statement + Send + '_>>;

    /// Create an accumulator for a batch of independent raw SQL strings.
    async fn raw_batch(&self) -> DbResult<Box<dyn RawBatch + Send + '_>>;

    /// Current autocommit state.
    async fn autocommit(&self) -> DbResult<bool>;

    /// Toggle autocommit. The engine captures the prior state and
    /// restores it unconditionally after a batch.
    async fn set_autocommit(&self, enabled: bool) -> DbResult<()>;

    /// Commit the open unit of work. Only meaningful with autocommit
    /// disabled.
    async fn commit(&self) -> DbResult<()>;
}

/// A prepared statement with positional parameters.
///
/// Binding is synchronous buffer mutation; only execution performs I/O.
/// Parameter indexes are zero-based.
#[async_trait]
pub trait Statement: Send {
    /// Bind a value at a zero-based position.
    fn bind(&mut self, index: usize, value: &Value) -> DbResult<()>;

    /// Typed date setter for dialects with narrower native binding.
    fn bind_date(&mut self, index: usize, value: NaiveDate) -> DbResult<()>;

    /// Typed timestamp setter for dialects with narrower native binding.
    fn bind_timestamp(&mut self, index: usize, value: NaiveDateTime) -> DbResult<()>;

    /// Move the currently bound parameters into the batch buffer.
    fn add_batch(&mut self) -> DbResult<()>;

    /// Execute and return a cursor over the result. The cursor owns its
    /// data; dropping the statement does not invalidate it.
    async fn execute_query(&mut self) -> DbResult<Box<dyn Rows + Send>>;

    /// Execute and return the affected-row count.
    async fn execute_update(&mut self) -> DbResult<u64>;

    /// Execute the accumulated batch, returning one affected-row count
    /// per unit in add order. Driver sentinel values (< 0) pass through.
    async fn execute_batch(&mut self) -> DbResult<Vec<i64>>;

    /// Cursor over the keys generated by the last `execute_update`,
    /// one row per key, subject to the prepare-time [`KeyRetrieval`].
    async fn generated_keys(&mut self) -> DbResult<Box<dyn Rows + Send>>;
}

/// A result cursor positioned before the first row.
#[async_trait]
pub trait Rows: Send {
    /// Column labels, in result order.
    fn columns(&self) -> &[String];

    /// Advance and return the next row's values in column order, or
    /// `None` when exhausted.
    async fn next(&mut self) -> DbResult<Option<Vec<Value>>>;
}

/// Accumulator for a batch of independent raw SQL statements.
#[async_trait]
pub trait RawBatch: Send {
    /// Queue one statement.
    fn add(&mut self, sql: &str) -> DbResult<()>;

    /// Execute the queued statements, returning one affected-row count
    /// per statement in add order, and clear the queue.
    async fn execute(&mut self) -> DbResult<Vec<i64>>;
}

/// Hands out connections scoped to one named configuration.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Acquire a connection for one top-level call.
    async fn acquire(&self) -> DbResult<Box<dyn Connection>>;

    /// Return a connection. Infallible from the engine's point of view;
    /// drivers log their own cleanup failures.
    async fn release(&self, conn: Box<dyn Connection>);

    /// Whether an ambient transaction is already active for this
    /// configuration. While true, the batch engine must not commit.
    fn in_transaction(&self) -> bool;
}

/// A fully buffered cursor. Drivers that fetch eagerly wrap their rows
/// in this instead of writing their own [`Rows`] implementation.
pub struct MaterializedRows {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
}

impl MaterializedRows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
        }
    }

    /// A cursor with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: VecDeque::new(),
        }
    }
}

#[async_trait]
impl Rows for MaterializedRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next(&mut self) -> DbResult<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_materialized_rows_drain_in_order() {
        let mut rows = MaterializedRows::new(
            vec!["id".to_string()],
            vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        );
        assert_eq!(rows.columns(), &["id".to_string()]);
        assert_eq!(rows.next().await.unwrap(), Some(vec![Value::Int(1)]));
        assert_eq!(rows.next().await.unwrap(), Some(vec![Value::Int(2)]));
        assert_eq!(rows.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_cursor() {
        let mut rows = MaterializedRows::empty();
        assert!(rows.columns().is_empty());
        assert_eq!(rows.next().await.unwrap(), None);
    }
}
