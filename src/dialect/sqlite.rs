//! SQLite dialect: unquoted identifiers, `?` placeholders, LIMIT/OFFSET
//! pagination, rowid-style generated keys.

use crate::dialect::{self, Dialect, SqlStyle};
use crate::models::record::Record;
use crate::models::value::Value;

const STYLE: SqlStyle = SqlStyle {
    quote: None,
    numbered_placeholders: false,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
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
        dialect::limit_offset_paginate(page_number, page_size, sql)
    }
}
