//! PostgreSQL dialect: double-quoted identifiers, `$n` placeholders,
//! LIMIT/OFFSET pagination.

use crate::dialect::{self, Dialect, SqlStyle};
use crate::models::record::Record;
use crate::models::value::Value;

const STYLE: SqlStyle = SqlStyle {
    quote: Some(('"', '"')),
    numbered_placeholders: true,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
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
    use crate::models::value::Value;

    #[test]
    fn test_numbered_placeholders() {
        let dialect = PostgresDialect;
        let keys = vec!["user_id".to_string(), "role_id".to_string()];
        assert_eq!(
            dialect.for_delete_by_id("user_role", &keys),
            r#"delete from "user_role" where "user_id" = $1 and "role_id" = $2"#
        );
    }

    #[test]
    fn test_save_numbering() {
        let dialect = PostgresDialect;
        let mut record = Record::new();
        record.set("name", "james").set("cash", 888i64);
        let (sql, params) = dialect.for_save("user", &["id".to_string()], &record);
        assert_eq!(sql, r#"insert into "user"("name", "cash") values($1, $2)"#);
        assert_eq!(params, vec![Value::Text("james".to_string()), Value::BigInt(888)]);
    }
}
