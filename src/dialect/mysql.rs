//! MySQL family dialect: backtick identifiers, `?` placeholders,
//! LIMIT/OFFSET pagination, driver-generated keys.

use crate::dialect::{self, Dialect, SqlStyle};
use crate::models::record::Record;
use crate::models::value::Value;

const STYLE: SqlStyle = SqlStyle {
    quote: Some(('`', '`')),
    numbered_placeholders: false,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtick_quoting() {
        let dialect = MysqlDialect;
        let keys = vec!["id".to_string()];
        assert_eq!(
            dialect.for_find_by_id("user", &keys),
            "select * from `user` where `id` = ?"
        );
        assert_eq!(
            dialect.for_delete_by_id("user", &keys),
            "delete from `user` where `id` = ?"
        );
    }

    #[test]
    fn test_paginate_limit_offset() {
        let dialect = MysqlDialect;
        assert_eq!(
            dialect.for_paginate(3, 10, "select * from user"),
            "select * from user limit 10 offset 20"
        );
    }

    #[test]
    fn test_defaults() {
        let dialect = MysqlDialect;
        assert_eq!(dialect.default_primary_key(), "id");
        assert!(!dialect.requires_explicit_key_names());
    }
}
