//! The `Db` facade.
//!
//! One `Db` is bound to one named configuration and composes the
//! executor, materializer, pagination, CRUD and batch components against
//! a connection acquired per call. The connection discipline is uniform:
//! acquire once, operate, release unconditionally — the release runs on
//! the error path too, and never masks the operation's own outcome.

use crate::config::DbConfig;
use crate::db::{batch, crud, materialize, paginate};
use crate::db::executor;
use crate::error::DbResult;
use crate::models::key::PrimaryKey;
use crate::models::page::Page;
use crate::models::record::Record;
use crate::models::value::{QueryRows, Value};
use std::sync::Arc;
use tracing::warn;

/// Engine handle for one configuration. Cheap to clone; all state is
/// call-local, so a `Db` can be shared freely across tasks.
#[derive(Clone, Debug)]
pub struct Db {
    config: Arc<DbConfig>,
}

impl Db {
    pub fn new(config: Arc<DbConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    fn default_key(&self) -> PrimaryKey {
        PrimaryKey::single(self.config.dialect().default_primary_key())
    }

    /// Execute a query and materialize it as scalars (one column) or
    /// tuples (several columns).
    pub async fn query(&self, sql: &str, params: &[Value]) -> DbResult<QueryRows> {
        let conn = self.config.provider().acquire().await?;
        let result = async {
            let rows = executor::execute_query(&self.config, conn.as_ref(), sql, params).await?;
            materialize::collect_values(rows).await
        }
        .await;
        self.config.provider().release(conn).await;
        result
    }

    /// First row's first column, or `None` for an empty result. Combine
    /// with the `Value` accessors for typed scalar queries.
    pub async fn query_column(&self, sql: &str, params: &[Value]) -> DbResult<Option<Value>> {
        let conn = self.config.provider().acquire().await?;
        let result = async {
            let rows = executor::execute_query(&self.config, conn.as_ref(), sql, params).await?;
            materialize::first_scalar(rows).await
        }
        .await;
        self.config.provider().release(conn).await;
        result
    }

    /// Execute an insert/update/delete statement, returning the
    /// affected-row count.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> DbResult<u64> {
        let conn = self.config.provider().acquire().await?;
        let result = executor::execute_update(&self.config, conn.as_ref(), sql, params).await;
        self.config.provider().release(conn).await;
        result
    }

    /// Execute a query and materialize every row as a record.
    pub async fn find(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Record>> {
        let conn = self.config.provider().acquire().await?;
        let result = async {
            let rows = executor::execute_query(&self.config, conn.as_ref(), sql, params).await?;
            materialize::collect_records(rows, self.config.container()).await
        }
        .await;
        self.config.provider().release(conn).await;
        result
    }

    /// First record of a query, or `None` for an empty result.
    pub async fn find_first(&self, sql: &str, params: &[Value]) -> DbResult<Option<Record>> {
        let conn = self.config.provider().acquire().await?;
        let result = async {
            let rows = executor::execute_query(&self.config, conn.as_ref(), sql, params).await?;
            materialize::first_record(rows, self.config.container()).await
        }
        .await;
        self.config.provider().release(conn).await;
        result
    }

    /// Find one record by the dialect's default primary key.
    pub async fn find_by_id(&self, table: &str, id: Value) -> DbResult<Option<Record>> {
        self.find_by_id_with_key(table, &self.default_key(), &[id])
            .await
    }

    /// Find one record by an explicit (possibly composite) key. The id
    /// value count must equal the key column count.
    pub async fn find_by_id_with_key(
        &self,
        table: &str,
        key: &PrimaryKey,
        ids: &[Value],
    ) -> DbResult<Option<Record>> {
        key.expect_ids(ids)?;
        let conn = self.config.provider().acquire().await?;
        let result = crud::find_by_id(&self.config, conn.as_ref(), table, key, ids).await;
        self.config.provider().release(conn).await;
        result
    }

    /// Insert a record using the dialect's default primary key,
    /// back-filling generated keys into the record.
    pub async fn save(&self, table: &str, record: &mut Record) -> DbResult<bool> {
        self.save_with_key(table, &self.default_key(), record).await
    }

    /// Insert a record with an explicit key.
    pub async fn save_with_key(
        &self,
        table: &str,
        key: &PrimaryKey,
        record: &mut Record,
    ) -> DbResult<bool> {
        let conn = self.config.provider().acquire().await?;
        let result = crud::save(&self.config, conn.as_ref(), table, key, record).await;
        self.config.provider().release(conn).await;
        result
    }

    /// Update a record by the dialect's default primary key. Returns
    /// false without executing when there is nothing to set.
    pub async fn update(&self, table: &str, record: &Record) -> DbResult<bool> {
        self.update_with_key(table, &self.default_key(), record).await
    }

    /// Update a record by an explicit key.
    pub async fn update_with_key(
        &self,
        table: &str,
        key: &PrimaryKey,
        record: &Record,
    ) -> DbResult<bool> {
        let conn = self.config.provider().acquire().await?;
        let result = crud::update(&self.config, conn.as_ref(), table, key, record).await;
        self.config.provider().release(conn).await;
        result
    }

    /// Delete by the dialect's default primary key.
    pub async fn delete_by_id(&self, table: &str, id: Value) -> DbResult<bool> {
        self.delete_by_id_with_key(table, &self.default_key(), &[id])
            .await
    }

    /// Delete by an explicit key. The id value count must equal the key
    /// column count.
    pub async fn delete_by_id_with_key(
        &self,
        table: &str,
        key: &PrimaryKey,
        ids: &[Value],
    ) -> DbResult<bool> {
        key.expect_ids(ids)?;
        let conn = self.config.provider().acquire().await?;
        let result = crud::delete_by_id(&self.config, conn.as_ref(), table, key, ids).await;
        self.config.provider().release(conn).await;
        result
    }

    /// Delete the row matching a record's default-primary-key value.
    pub async fn delete(&self, table: &str, record: &Record) -> DbResult<bool> {
        self.delete_with_key(table, &self.default_key(), record).await
    }

    /// Delete the row matching a record's key values under an explicit
    /// (possibly composite) key.
    pub async fn delete_with_key(
        &self,
        table: &str,
        key: &PrimaryKey,
        record: &Record,
    ) -> DbResult<bool> {
        let conn = self.config.provider().acquire().await?;
        let result = crud::delete_record(&self.config, conn.as_ref(), table, key, record).await;
        self.config.provider().release(conn).await;
        result
    }

    /// Paginate a query: 1-based page number, page size ≥ 1. A page past
    /// the end returns empty items with the real totals.
    pub async fn paginate(
        &self,
        page_number: u64,
        page_size: u64,
        sql: &str,
        params: &[Value],
    ) -> DbResult<Page<Record>> {
        let conn = self.config.provider().acquire().await?;
        let result = paginate::paginate(
            &self.config,
            conn.as_ref(),
            page_number,
            page_size,
            sql,
            params,
        )
        .await;
        self.config.provider().release(conn).await;
        result
    }

    /// Execute one statement template over a sequence of parameter rows
    /// in chunks of `batch_size`. The outcome sequence matches the input
    /// length and order regardless of chunking.
    pub async fn batch(
        &self,
        sql: &str,
        rows: &[Vec<Value>],
        batch_size: usize,
    ) -> DbResult<Vec<i64>> {
        batch::validate_batch_size(batch_size)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.config.provider().acquire().await?;
        let result = async {
            let prior = conn.autocommit().await?;
            conn.set_autocommit(false).await?;
            let outcome =
                batch::run_rows(&self.config, conn.as_ref(), sql, rows, batch_size).await;
            if let Err(err) = conn.set_autocommit(prior).await {
                warn!(error = %err, "failed to restore autocommit after batch");
            }
            outcome
        }
        .await;
        self.config.provider().release(conn).await;
        result
    }

    /// Execute one statement template over records, reading each bound
    /// value through the comma-separated column list (names trimmed).
    pub async fn batch_records(
        &self,
        sql: &str,
        columns: &str,
        records: &[Record],
        batch_size: usize,
    ) -> DbResult<Vec<i64>> {
        batch::validate_batch_size(batch_size)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let columns = batch::split_columns(columns);
        let conn = self.config.provider().acquire().await?;
        let result = async {
            let prior = conn.autocommit().await?;
            conn.set_autocommit(false).await?;
            let outcome = batch::run_records(
                &self.config,
                conn.as_ref(),
                sql,
                &columns,
                records,
                batch_size,
            )
            .await;
            if let Err(err) = conn.set_autocommit(prior).await {
                warn!(error = %err, "failed to restore autocommit after batch");
            }
            outcome
        }
        .await;
        self.config.provider().release(conn).await;
        result
    }

    /// Execute a sequence of independent raw SQL statements in chunks.
    pub async fn batch_sql(&self, statements: &[String], batch_size: usize) -> DbResult<Vec<i64>> {
        batch::validate_batch_size(batch_size)?;
        if statements.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.config.provider().acquire().await?;
        let result = async {
            let prior = conn.autocommit().await?;
            conn.set_autocommit(false).await?;
            let outcome =
                batch::run_sql_list(&self.config, conn.as_ref(), statements, batch_size).await;
            if let Err(err) = conn.set_autocommit(prior).await {
                warn!(error = %err, "failed to restore autocommit after batch");
            }
            outcome
        }
        .await;
        self.config.provider().release(conn).await;
        result
    }

    /// Batch-insert records using the INSERT statement derived from the
    /// first record. Every record must use the same column set as the
    /// first.
    pub async fn batch_save(
        &self,
        table: &str,
        records: &[Record],
        batch_size: usize,
    ) -> DbResult<Vec<i64>> {
        let Some(first) = records.first() else {
            return Ok(Vec::new());
        };
        let columns: Vec<&str> = first.column_names().collect();
        let columns = columns.join(",");
        let (sql, _) = self.config.dialect().for_save(table, &[], first);
        self.batch_records(&sql, &columns, records, batch_size).await
    }

    /// Batch-update records using the column set of the first record:
    /// non-key columns become the SET list, key columns the predicate.
    pub async fn batch_update(
        &self,
        table: &str,
        key: &PrimaryKey,
        records: &[Record],
        batch_size: usize,
    ) -> DbResult<Vec<i64>> {
        let Some(first) = records.first() else {
            return Ok(Vec::new());
        };
        let dialect = self.config.dialect();
        let mut columns: Vec<String> = first
            .column_names()
            .filter(|name| !dialect.is_key_column(name, key.columns()))
            .map(str::to_string)
            .collect();
        columns.extend(key.columns().iter().cloned());
        let columns = columns.join(",");

        let placeholder_ids = vec![Value::Null; key.len()];
        let (sql, _) = dialect.for_update(table, key.columns(), &placeholder_ids, first);
        self.batch_records(&sql, &columns, records, batch_size).await
    }
}
