//! sqlx-backed driver over `sqlx::any`, so one codepath serves MySQL,
//! PostgreSQL and SQLite.
//!
//! JDBC-shaped semantics are emulated where sqlx has no direct
//! counterpart, with the differences documented here:
//! - autocommit toggling maps to explicit BEGIN/COMMIT statements; with
//!   autocommit off, `commit` closes the open unit of work and starts
//!   the next one;
//! - batch execution runs the accumulated rows sequentially on the
//!   connection (chunk boundaries still control commit timing);
//! - generated keys come from the driver's last-insert-id, so only the
//!   first generated key column is observable;
//! - date, time, timestamp and decimal parameters are bound as their
//!   canonical text forms — the typed `bind_date`/`bind_timestamp`
//!   setters funnel into the same buffer.
//!
//! Row decoding classifies the reported column type into a category and
//! falls back to a try-get cascade when the category is unknown.

use crate::db::connection::{
    Connection, ConnectionProvider, KeyRetrieval, MaterializedRows, RawBatch, Rows, Statement,
};
use crate::error::{DbError, DbResult};
use crate::models::value::Value;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyQueryResult, AnyRow};
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Column, Executor, Row, TypeInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

// =============================================================================
// Provider
// =============================================================================

/// Connection provider backed by a sqlx `AnyPool`. Pooling itself is
/// sqlx's concern; this type only hands connections out per call and
/// reports the ambient-transaction mark.
pub struct SqlxProvider {
    pool: AnyPool,
    ambient: AtomicBool,
}

static INSTALL_DRIVERS: std::sync::Once = std::sync::Once::new();

impl SqlxProvider {
    /// Connect a pool for the given database URL
    /// (`mysql://`, `postgres://` or `sqlite:`).
    pub async fn connect(url: &str, max_connections: u32) -> DbResult<Self> {
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(DbError::from)?;
        debug!(url = %url, max_connections, "connected sqlx pool");
        Ok(Self {
            pool,
            ambient: AtomicBool::new(false),
        })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Mark the start/end of a caller-managed transaction. While marked,
    /// the batch engine leaves commit timing to the caller.
    pub fn mark_transaction(&self, active: bool) {
        self.ambient.store(active, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectionProvider for SqlxProvider {
    async fn acquire(&self) -> DbResult<Box<dyn Connection>> {
        let conn = self.pool.acquire().await.map_err(DbError::from)?;
        Ok(Box::new(SqlxConnection {
            inner: Mutex::new(conn),
            autocommit: AtomicBool::new(true),
        }))
    }

    async fn release(&self, conn: Box<dyn Connection>) {
        // End any emulated transaction before the connection goes back
        // to the pool.
        if let Err(err) = conn.set_autocommit(true).await {
            warn!(error = %err, "failed to reset autocommit on release");
        }
        drop(conn);
    }

    fn in_transaction(&self) -> bool {
        self.ambient.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Connection
// =============================================================================

pub struct SqlxConnection {
    inner: Mutex<PoolConnection<Any>>,
    /// Emulated JDBC autocommit state; true means every statement
    /// commits on its own.
    autocommit: AtomicBool,
}

#[async_trait]
impl Connection for SqlxConnection {
    async fn prepare(
        &self,
        sql: &str,
        keys: KeyRetrieval,
    ) -> DbResult<Box<dyn Statement + Send + '_>> {
        Ok(Box::new(SqlxStatement {
            conn: self,
            sql: sql.to_string(),
            keys,
            binds: Vec::new(),
            batch: Vec::new(),
            generated: Vec::new(),
        }))
    }

    async fn raw_batch(&self) -> DbResult<Box<dyn RawBatch + Send + '_>> {
        Ok(Box::new(SqlxRawBatch {
            conn: self,
            pending: Vec::new(),
        }))
    }

    async fn autocommit(&self) -> DbResult<bool> {
        Ok(self.autocommit.load(Ordering::SeqCst))
    }

    async fn set_autocommit(&self, enabled: bool) -> DbResult<()> {
        if self.autocommit.load(Ordering::SeqCst) == enabled {
            return Ok(());
        }
        let mut conn = self.inner.lock().await;
        if enabled {
            // Leaving manual mode commits the open unit of work.
            raw_exec(&mut *conn, "COMMIT").await?;
        } else {
            raw_exec(&mut *conn, "BEGIN").await?;
        }
        self.autocommit.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    async fn commit(&self) -> DbResult<()> {
        if self.autocommit.load(Ordering::SeqCst) {
            return Ok(());
        }
        let mut conn = self.inner.lock().await;
        raw_exec(&mut *conn, "COMMIT").await?;
        raw_exec(&mut *conn, "BEGIN").await?;
        Ok(())
    }
}

async fn raw_exec(conn: &mut PoolConnection<Any>, sql: &str) -> DbResult<()> {
    (&mut **conn).execute(sql).await.map_err(DbError::from)?;
    Ok(())
}

// =============================================================================
// Statement
// =============================================================================

struct SqlxStatement<'c> {
    conn: &'c SqlxConnection,
    sql: String,
    keys: KeyRetrieval,
    binds: Vec<Value>,
    batch: Vec<Vec<Value>>,
    generated: Vec<Value>,
}

impl SqlxStatement<'_> {
    fn set_bind(&mut self, index: usize, value: Value) {
        if self.binds.len() <= index {
            self.binds.resize(index + 1, Value::Null);
        }
        self.binds[index] = value;
    }
}

#[async_trait]
impl Statement for SqlxStatement<'_> {
    fn bind(&mut self, index: usize, value: &Value) -> DbResult<()> {
        self.set_bind(index, value.clone());
        Ok(())
    }

    fn bind_date(&mut self, index: usize, value: NaiveDate) -> DbResult<()> {
        self.set_bind(index, Value::Date(value));
        Ok(())
    }

    fn bind_timestamp(&mut self, index: usize, value: NaiveDateTime) -> DbResult<()> {
        self.set_bind(index, Value::Timestamp(value));
        Ok(())
    }

    fn add_batch(&mut self) -> DbResult<()> {
        self.batch.push(std::mem::take(&mut self.binds));
        Ok(())
    }

    async fn execute_query(&mut self) -> DbResult<Box<dyn Rows + Send>> {
        let params = std::mem::take(&mut self.binds);
        let mut conn = self.conn.inner.lock().await;
        let rows = fetch_rows(&mut *conn, &self.sql, &params).await?;
        Ok(Box::new(rows))
    }

    async fn execute_update(&mut self) -> DbResult<u64> {
        let params = std::mem::take(&mut self.binds);
        let mut conn = self.conn.inner.lock().await;
        let result = run_update(&mut *conn, &self.sql, &params).await?;
        self.generated = result
            .last_insert_id()
            .map(Value::BigInt)
            .into_iter()
            .collect();
        Ok(result.rows_affected())
    }

    async fn execute_batch(&mut self) -> DbResult<Vec<i64>> {
        let batch = std::mem::take(&mut self.batch);
        let mut conn = self.conn.inner.lock().await;
        let mut outcomes = Vec::with_capacity(batch.len());
        for params in &batch {
            let result = run_update(&mut *conn, &self.sql, params).await?;
            outcomes.push(result.rows_affected() as i64);
        }
        Ok(outcomes)
    }

    async fn generated_keys(&mut self) -> DbResult<Box<dyn Rows + Send>> {
        if self.keys == KeyRetrieval::None {
            return Ok(Box::new(MaterializedRows::empty()));
        }
        let rows = self.generated.iter().map(|v| vec![v.clone()]).collect();
        Ok(Box::new(MaterializedRows::new(
            vec!["generated_key".to_string()],
            rows,
        )))
    }
}

// =============================================================================
// Raw SQL batch
// =============================================================================

struct SqlxRawBatch<'c> {
    conn: &'c SqlxConnection,
    pending: Vec<String>,
}

#[async_trait]
impl RawBatch for SqlxRawBatch<'_> {
    fn add(&mut self, sql: &str) -> DbResult<()> {
        self.pending.push(sql.to_string());
        Ok(())
    }

    async fn execute(&mut self) -> DbResult<Vec<i64>> {
        let pending = std::mem::take(&mut self.pending);
        let mut conn = self.conn.inner.lock().await;
        let mut outcomes = Vec::with_capacity(pending.len());
        for sql in &pending {
            let result = run_update(&mut *conn, sql, &[]).await?;
            outcomes.push(result.rows_affected() as i64);
        }
        Ok(outcomes)
    }
}

// =============================================================================
// Query plumbing
// =============================================================================

async fn run_update(
    conn: &mut PoolConnection<Any>,
    sql: &str,
    params: &[Value],
) -> DbResult<AnyQueryResult> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_value(query, param);
    }
    query.execute(&mut **conn).await.map_err(DbError::from)
}

async fn fetch_rows(
    conn: &mut PoolConnection<Any>,
    sql: &str,
    params: &[Value],
) -> DbResult<MaterializedRows> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_value(query, param);
    }
    let rows: Vec<AnyRow> = query.fetch_all(&mut **conn).await.map_err(DbError::from)?;
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let decoded = rows.iter().map(decode_row).collect();
    Ok(MaterializedRows::new(columns, decoded))
}

fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: &'q Value,
) -> Query<'q, Any, AnyArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::BigInt(v) => query.bind(*v),
        Value::Float(v) => query.bind(f64::from(*v)),
        Value::Double(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.clone()),
        Value::Date(v) => query.bind(v.format("%Y-%m-%d").to_string()),
        Value::Time(v) => query.bind(v.format("%H:%M:%S%.f").to_string()),
        Value::Timestamp(v) => query.bind(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Value::Decimal(v) => query.bind(v.as_str()),
    }
}

// =============================================================================
// Row decoding
// =============================================================================

/// Logical category for reported column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Binary,
    Unknown,
}

/// Classify a column type name into a logical category. Matching is by
/// substring because the Any driver surfaces backend-native names.
fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/numeric first: overlaps with the float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }
    if lower.contains("int") || lower.contains("serial") {
        return TypeCategory::Integer;
    }
    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }
    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }
    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }
    TypeCategory::Unknown
}

fn decode_row(row: &AnyRow) -> Vec<Value> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| decode_column(row, idx, col.type_info().name()))
        .collect()
}

fn decode_column(row: &AnyRow, idx: usize, type_name: &str) -> Value {
    match categorize_type(type_name) {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Boolean => decode_boolean(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Binary => decode_binary(row, idx),
        TypeCategory::Unknown => decode_fallback(row, idx),
    }
}

fn decode_decimal(row: &AnyRow, idx: usize) -> Value {
    // Keep the exact database representation; never round-trip through
    // a float.
    match row.try_get::<Option<String>, _>(idx) {
        Ok(Some(v)) => Value::Decimal(v),
        Ok(None) => Value::Null,
        Err(_) => decode_fallback(row, idx),
    }
}

fn decode_integer(row: &AnyRow, idx: usize) -> Value {
    if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Null;
    }
    if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
        return Value::Int(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::BigInt(v);
    }
    Value::Null
}

fn decode_boolean(row: &AnyRow, idx: usize) -> Value {
    if let Ok(Some(v)) = row.try_get::<Option<bool>, _>(idx) {
        return Value::Bool(v);
    }
    // Some backends surface booleans as integers
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Bool(v != 0);
    }
    Value::Null
}

fn decode_float(row: &AnyRow, idx: usize) -> Value {
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return Value::Double(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
        return Value::Float(v);
    }
    Value::Null
}

fn decode_binary(row: &AnyRow, idx: usize) -> Value {
    row.try_get::<Option<Vec<u8>>, _>(idx)
        .ok()
        .flatten()
        .map(Value::Bytes)
        .unwrap_or(Value::Null)
}

fn decode_fallback(row: &AnyRow, idx: usize) -> Value {
    if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
        return Value::Text(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::BigInt(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return Value::Double(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<bool>, _>(idx) {
        return Value::Bool(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return Value::Bytes(v);
    }
    Value::Null
}
