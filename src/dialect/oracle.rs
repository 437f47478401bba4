//! Oracle dialect: sequence-style key handling and ROWNUM pagination.
//!
//! Oracle differs from the LIMIT/OFFSET families in three ways the engine
//! must know about: key columns are named at statement-prepare time and
//! refreshed unconditionally after insert, pagination goes through a
//! ROWNUM window, and date/timestamp parameters need the statement's
//! typed setters instead of generic binding.

use crate::db::connection::Statement;
use crate::dialect::{self, Dialect, SqlStyle};
use crate::error::DbResult;
use crate::models::record::Record;
use crate::models::value::Value;

const STYLE: SqlStyle = SqlStyle {
    quote: None,
    numbered_placeholders: false,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn requires_explicit_key_names(&self) -> bool {
        true
    }

    fn bind_parameters(&self, stmt: &mut dyn Statement, params: &[Value]) -> DbResult<()> {
        for (index, value) in params.iter().enumerate() {
            match value {
                Value::Date(date) => stmt.bind_date(index, *date)?,
                Value::Timestamp(ts) => stmt.bind_timestamp(index, *ts)?,
                other => stmt.bind(index, other)?,
            }
        }
        Ok(())
    }

    fn for_find_by_id(&self, table: &str, keys: &[String]) -> String {
        dialect::find_by_id_sql(STYLE, table, keys)
    }

    fn for_delete_by_id(&self, table: &str, keys: &[String]) -> String {
        dialect::delete_by_id_sql(STYLE, table, keys)
    }

    fn for_save(&self, table: &str, _keys: &[String], record: &Record) -> (String, Vec<Value>) {
        dialect::save_sql(STYLE, table, record)
    }

    fn for_update(
        &self,
        table: &str,
        keys: &[String],
        ids: &[Value],
        record: &Record,
    ) -> (String, Vec<Value>) {
        dialect::update_sql(STYLE, table, keys, ids, record, &|name| {
            self.is_key_column(name, keys)
        })
    }

    fn for_paginate(&self, page_number: u64, page_size: u64, sql: &str) -> String {
        let end = page_number * page_size;
        let start = (page_number - 1) * page_size;
        format!(
            "select * from ( select row_.*, rownum rownum_ from ( {sql} ) row_ \
             where rownum <= {end} ) table_alias where table_alias.rownum_ > {start}"
        )
    }
}
