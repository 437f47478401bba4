//! CRUD orchestration: save with generated-key retrieval, update with
//! no-op detection, delete by id or by record, find by id.
//!
//! All SQL text comes from the configuration's dialect; this module owns
//! the key extraction/validation and the generated-key back-fill.

use crate::config::DbConfig;
use crate::db::connection::{Connection, KeyRetrieval, Statement};
use crate::db::{executor, materialize};
use crate::error::{DbError, DbResult};
use crate::models::key::PrimaryKey;
use crate::models::record::Record;
use crate::models::value::Value;
use tracing::debug;

pub(crate) async fn find_by_id(
    config: &DbConfig,
    conn: &dyn Connection,
    table: &str,
    key: &PrimaryKey,
    ids: &[Value],
) -> DbResult<Option<Record>> {
    key.expect_ids(ids)?;
    let sql = config.dialect().for_find_by_id(table, key.columns());
    let rows = executor::execute_query(config, conn, &sql, ids).await?;
    materialize::first_record(rows, config.container()).await
}

/// Insert a record. After execution, key columns the caller left absent
/// or null are back-filled from the generated-key cursor in key-column
/// order; explicit-key dialects refresh every key column. Returns true
/// iff at least one row was affected.
pub(crate) async fn save(
    config: &DbConfig,
    conn: &dyn Connection,
    table: &str,
    key: &PrimaryKey,
    record: &mut Record,
) -> DbResult<bool> {
    let dialect = config.dialect();
    let (sql, params) = dialect.for_save(table, key.columns(), record);
    let retrieval = if dialect.requires_explicit_key_names() {
        KeyRetrieval::Named(key.columns().to_vec())
    } else {
        KeyRetrieval::Generated
    };

    debug!(sql = %sql, table = %table, "saving record");
    let mut stmt = conn.prepare(&sql, retrieval).await?;
    dialect.bind_parameters(stmt.as_mut(), &params)?;
    let affected = stmt.execute_update().await?;
    read_generated_keys(config, stmt.as_mut(), key, record).await?;
    Ok(affected >= 1)
}

/// Populate missing key values from the generated-key cursor, stopping
/// when the cursor is exhausted. Caller-supplied keys are left untouched
/// unless the dialect mandates an unconditional refresh.
async fn read_generated_keys(
    config: &DbConfig,
    stmt: &mut dyn Statement,
    key: &PrimaryKey,
    record: &mut Record,
) -> DbResult<()> {
    let refresh_all = config.dialect().requires_explicit_key_names();
    let mut keys_rows = stmt.generated_keys().await?;
    for column in key.columns() {
        let missing = record.get(column).is_none_or(Value::is_null);
        if missing || refresh_all {
            match keys_rows.next().await? {
                Some(mut row) => {
                    let value = if row.is_empty() {
                        Value::Null
                    } else {
                        row.swap_remove(0)
                    };
                    record.set(column.clone(), value);
                }
                None => break,
            }
        }
    }
    Ok(())
}

/// Update a record by its primary key. A record carrying nothing besides
/// the key predicate is a no-op returning false, not an error.
pub(crate) async fn update(
    config: &DbConfig,
    conn: &dyn Connection,
    table: &str,
    key: &PrimaryKey,
    record: &Record,
) -> DbResult<bool> {
    let mut ids = Vec::with_capacity(key.len());
    for column in key.columns() {
        match record.get(column) {
            Some(value) if !value.is_null() => ids.push(value.clone()),
            _ => {
                return Err(DbError::precondition(format!(
                    "cannot update without a complete primary key, \"{column}\" is missing"
                )));
            }
        }
    }

    let (sql, params) = config.dialect().for_update(table, key.columns(), &ids, record);
    if params.len() <= key.len() {
        debug!(table = %table, "nothing to update besides the key predicate");
        return Ok(false);
    }

    let affected = executor::execute_update(config, conn, &sql, &params).await?;
    Ok(affected >= 1)
}

pub(crate) async fn delete_by_id(
    config: &DbConfig,
    conn: &dyn Connection,
    table: &str,
    key: &PrimaryKey,
    ids: &[Value],
) -> DbResult<bool> {
    key.expect_ids(ids)?;
    let sql = config.dialect().for_delete_by_id(table, key.columns());
    let affected = executor::execute_update(config, conn, &sql, ids).await?;
    Ok(affected >= 1)
}

/// Delete using the key values found in the record. A single-column key
/// delegates directly; a composite key requires every key value to be
/// present and non-null.
pub(crate) async fn delete_record(
    config: &DbConfig,
    conn: &dyn Connection,
    table: &str,
    key: &PrimaryKey,
    record: &Record,
) -> DbResult<bool> {
    if !key.is_composite() {
        let id = record
            .get(&key.columns()[0])
            .cloned()
            .unwrap_or(Value::Null);
        return delete_by_id(config, conn, table, key, &[id]).await;
    }

    let mut ids = Vec::with_capacity(key.len());
    for column in key.columns() {
        match record.get(column) {
            Some(value) if !value.is_null() => ids.push(value.clone()),
            _ => {
                return Err(DbError::precondition(format!(
                    "the value of primary key \"{column}\" can not be null in the record"
                )));
            }
        }
    }
    delete_by_id(config, conn, table, key, &ids).await
}
