//! Statement execution.
//!
//! Binds positional parameters through the configuration's dialect and
//! executes one statement against a connection handed in by the caller.
//! Statements are dropped before returning on every path, so driver
//! resources never outlive the call; returned cursors own their data.
//! Execution errors arrive already wrapped from the driver and are
//! propagated without retry.

use crate::config::DbConfig;
use crate::db::connection::{Connection, KeyRetrieval, Rows};
use crate::error::DbResult;
use crate::models::value::Value;
use tracing::debug;

/// Execute a query and return its cursor.
pub(crate) async fn execute_query(
    config: &DbConfig,
    conn: &dyn Connection,
    sql: &str,
    params: &[Value],
) -> DbResult<Box<dyn Rows + Send>> {
    debug!(sql = %sql, params = params.len(), "executing query");
    let mut stmt = conn.prepare(sql, KeyRetrieval::None).await?;
    config.dialect().bind_parameters(stmt.as_mut(), params)?;
    stmt.execute_query().await
}

/// Execute an insert/update/delete and return the affected-row count.
pub(crate) async fn execute_update(
    config: &DbConfig,
    conn: &dyn Connection,
    sql: &str,
    params: &[Value],
) -> DbResult<u64> {
    debug!(sql = %sql, params = params.len(), "executing update");
    let mut stmt = conn.prepare(sql, KeyRetrieval::None).await?;
    config.dialect().bind_parameters(stmt.as_mut(), params)?;
    stmt.execute_update().await
}
