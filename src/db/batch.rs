//! Chunked batch execution.
//!
//! Three input modes share one loop: parameter rows against a single
//! statement template, records read through a caller-supplied column
//! list, and independent raw SQL strings. Units accumulate on one
//! statement; every `batch_size`-th unit flushes, and a flush commits
//! only when no ambient transaction was active when the call started —
//! a caller that opened its own transaction keeps full control over
//! atomicity. The remainder is flushed unconditionally after the loop
//! with the same ambient-gated commit. Chunk boundaries are invisible in
//! the outcome sequence: it always matches the input length and order.
//!
//! If a flush fails mid-loop, chunks committed earlier stay committed
//! (or stay part of the caller's open transaction); there is no
//! compensating rollback.

use crate::config::DbConfig;
use crate::db::connection::{Connection, KeyRetrieval, Statement};
use crate::error::{DbError, DbResult};
use crate::models::record::Record;
use crate::models::value::Value;
use tracing::debug;

pub(crate) fn validate_batch_size(batch_size: usize) -> DbResult<()> {
    if batch_size < 1 {
        return Err(DbError::precondition("batchSize must be at least 1"));
    }
    Ok(())
}

/// Split a comma-separated column list, trimming each name.
pub(crate) fn split_columns(columns: &str) -> Vec<String> {
    columns
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

async fn flush(
    conn: &dyn Connection,
    stmt: &mut dyn Statement,
    in_transaction: bool,
    outcomes: &mut Vec<i64>,
) -> DbResult<()> {
    let results = stmt.execute_batch().await?;
    if !in_transaction {
        conn.commit().await?;
    }
    debug!(flushed = results.len(), "batch chunk flushed");
    outcomes.extend(results);
    Ok(())
}

/// One statement template, one parameter tuple per row.
pub(crate) async fn run_rows(
    config: &DbConfig,
    conn: &dyn Connection,
    sql: &str,
    rows: &[Vec<Value>],
    batch_size: usize,
) -> DbResult<Vec<i64>> {
    let in_transaction = config.provider().in_transaction();
    let mut stmt = conn.prepare(sql, KeyRetrieval::None).await?;
    let mut outcomes = Vec::with_capacity(rows.len());
    let mut pending = 0;
    for row in rows {
        config.dialect().bind_parameters(stmt.as_mut(), row)?;
        stmt.add_batch()?;
        pending += 1;
        if pending >= batch_size {
            pending = 0;
            flush(conn, stmt.as_mut(), in_transaction, &mut outcomes).await?;
        }
    }
    flush(conn, stmt.as_mut(), in_transaction, &mut outcomes).await?;
    Ok(outcomes)
}

/// One statement template, values read from each record through the
/// column list. A column missing from a record binds null.
pub(crate) async fn run_records(
    config: &DbConfig,
    conn: &dyn Connection,
    sql: &str,
    columns: &[String],
    records: &[Record],
    batch_size: usize,
) -> DbResult<Vec<i64>> {
    let in_transaction = config.provider().in_transaction();
    let mut stmt = conn.prepare(sql, KeyRetrieval::None).await?;
    let mut outcomes = Vec::with_capacity(records.len());
    let mut pending = 0;
    for record in records {
        let row: Vec<Value> = columns
            .iter()
            .map(|column| record.get(column).cloned().unwrap_or(Value::Null))
            .collect();
        config.dialect().bind_parameters(stmt.as_mut(), &row)?;
        stmt.add_batch()?;
        pending += 1;
        if pending >= batch_size {
            pending = 0;
            flush(conn, stmt.as_mut(), in_transaction, &mut outcomes).await?;
        }
    }
    flush(conn, stmt.as_mut(), in_transaction, &mut outcomes).await?;
    Ok(outcomes)
}

/// Independent raw SQL statements.
pub(crate) async fn run_sql_list(
    config: &DbConfig,
    conn: &dyn Connection,
    statements: &[String],
    batch_size: usize,
) -> DbResult<Vec<i64>> {
    let in_transaction = config.provider().in_transaction();
    let mut batch = conn.raw_batch().await?;
    let mut outcomes = Vec::with_capacity(statements.len());
    let mut pending = 0;
    for sql in statements {
        batch.add(sql)?;
        pending += 1;
        if pending >= batch_size {
            pending = 0;
            let results = batch.execute().await?;
            if !in_transaction {
                conn.commit().await?;
            }
            debug!(flushed = results.len(), "raw batch chunk flushed");
            outcomes.extend(results);
        }
    }
    let results = batch.execute().await?;
    if !in_transaction {
        conn.commit().await?;
    }
    debug!(flushed = results.len(), "raw batch chunk flushed");
    outcomes.extend(results);
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_batch_size() {
        assert!(validate_batch_size(0).unwrap_err().is_precondition());
        assert!(validate_batch_size(1).is_ok());
    }

    #[test]
    fn test_split_columns_trims() {
        assert_eq!(
            split_columns("name, cash ,  age"),
            vec!["name".to_string(), "cash".to_string(), "age".to_string()]
        );
        assert_eq!(split_columns("name"), vec!["name".to_string()]);
    }
}
