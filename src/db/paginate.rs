//! Pagination.
//!
//! Two round trips on the same connection: a wrapped count query for the
//! totals, then a dialect-built offset/limit slice for the items. They
//! cannot be one query because the slice syntax is dialect-specific while
//! the count derivation is not.

use crate::config::DbConfig;
use crate::db::connection::Connection;
use crate::db::{executor, materialize};
use crate::error::{DbError, DbResult};
use crate::models::page::Page;
use crate::models::record::Record;
use crate::models::value::Value;

/// Wrap a query so it counts its own rows. The derived table alias is
/// required by MySQL and accepted everywhere else.
pub(crate) fn count_sql(sql: &str) -> String {
    format!("select count(*) from ( {sql} ) count_alias")
}

pub(crate) async fn paginate(
    config: &DbConfig,
    conn: &dyn Connection,
    page_number: u64,
    page_size: u64,
    sql: &str,
    params: &[Value],
) -> DbResult<Page<Record>> {
    if page_number < 1 || page_size < 1 {
        return Err(DbError::precondition(
            "pageNumber and pageSize must be at least 1",
        ));
    }

    let total_sql = count_sql(sql);
    let count_rows = executor::execute_query(config, conn, &total_sql, params).await?;
    let total_row = materialize::first_scalar(count_rows)
        .await?
        .as_ref()
        .and_then(Value::as_i64)
        .unwrap_or(0)
        .max(0) as u64;

    // Empty table: a valid empty page, not an error.
    if total_row == 0 {
        return Ok(Page::new(Vec::new(), page_number, page_size, 0, 0));
    }

    let total_page = total_row / page_size + u64::from(total_row % page_size != 0);

    // Past the end: report the real totals with no items.
    if page_number > total_page {
        return Ok(Page::new(
            Vec::new(),
            page_number,
            page_size,
            total_page,
            total_row,
        ));
    }

    let page_sql = config.dialect().for_paginate(page_number, page_size, sql);
    let rows = executor::execute_query(config, conn, &page_sql, params).await?;
    let items = materialize::collect_records(rows, config.container()).await?;
    Ok(Page::new(items, page_number, page_size, total_page, total_row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_sql_wraps_with_alias() {
        assert_eq!(
            count_sql("select * from user where age > ?"),
            "select count(*) from ( select * from user where age > ? ) count_alias"
        );
    }
}
