//! SQL dialect capability.
//!
//! A [`Dialect`] translates table/column/key semantics into literal SQL
//! for one database family and owns parameter binding, so dialects with
//! narrower native binding can route dates and timestamps through the
//! statement's typed setters. One flat struct per family; the shared
//! assembly helpers in this module carry the text differences (identifier
//! quoting, placeholder style).

pub mod mysql;
pub mod oracle;
pub mod postgres;
pub mod sqlite;

pub use mysql::MysqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::db::connection::Statement;
use crate::error::DbResult;
use crate::models::record::Record;
use crate::models::value::Value;

/// Pluggable SQL generation and parameter binding for one database
/// family.
pub trait Dialect: Send + Sync {
    /// Key column assumed when the caller names none.
    fn default_primary_key(&self) -> &str {
        "id"
    }

    /// True for sequence-style dialects that must name the key columns
    /// at statement-prepare time and refresh them unconditionally after
    /// insert.
    fn requires_explicit_key_names(&self) -> bool {
        false
    }

    /// Whether `name` is one of the key columns. Column labels compare
    /// case-insensitively, matching database identifier conventions.
    fn is_key_column(&self, name: &str, keys: &[String]) -> bool {
        keys.iter().any(|k| k.eq_ignore_ascii_case(name))
    }

    /// Bind positional parameters onto a prepared statement.
    fn bind_parameters(&self, stmt: &mut dyn Statement, params: &[Value]) -> DbResult<()> {
        for (index, value) in params.iter().enumerate() {
            stmt.bind(index, value)?;
        }
        Ok(())
    }

    /// SELECT-by-key statement for `find_by_id`.
    fn for_find_by_id(&self, table: &str, keys: &[String]) -> String;

    /// DELETE-by-key statement.
    fn for_delete_by_id(&self, table: &str, keys: &[String]) -> String;

    /// INSERT statement over the record's columns, with the bound values
    /// in column order.
    fn for_save(&self, table: &str, keys: &[String], record: &Record) -> (String, Vec<Value>);

    /// UPDATE statement over the record's non-key columns with a WHERE
    /// clause over the key columns; bound values are the SET values
    /// followed by `ids`.
    fn for_update(
        &self,
        table: &str,
        keys: &[String],
        ids: &[Value],
        record: &Record,
    ) -> (String, Vec<Value>);

    /// Offset/limit form of `sql` for the requested 1-based page.
    fn for_paginate(&self, page_number: u64, page_size: u64, sql: &str) -> String;
}

/// Text-level differences between dialect families.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SqlStyle {
    /// Identifier quoting pair, if the family quotes identifiers.
    pub quote: Option<(char, char)>,
    /// `$1, $2, ...` placeholders instead of `?`.
    pub numbered_placeholders: bool,
}

impl SqlStyle {
    pub(crate) fn ident(&self, name: &str) -> String {
        match self.quote {
            Some((open, close)) => format!("{open}{name}{close}"),
            None => name.to_string(),
        }
    }

    /// Placeholder for the given 1-based ordinal.
    pub(crate) fn placeholder(&self, ordinal: usize) -> String {
        if self.numbered_placeholders {
            format!("${ordinal}")
        } else {
            "?".to_string()
        }
    }

    fn key_predicate(&self, keys: &[String], first_ordinal: usize) -> String {
        keys.iter()
            .enumerate()
            .map(|(i, key)| format!("{} = {}", self.ident(key), self.placeholder(first_ordinal + i)))
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

pub(crate) fn find_by_id_sql(style: SqlStyle, table: &str, keys: &[String]) -> String {
    format!(
        "select * from {} where {}",
        style.ident(table),
        style.key_predicate(keys, 1)
    )
}

pub(crate) fn delete_by_id_sql(style: SqlStyle, table: &str, keys: &[String]) -> String {
    format!(
        "delete from {} where {}",
        style.ident(table),
        style.key_predicate(keys, 1)
    )
}

pub(crate) fn save_sql(style: SqlStyle, table: &str, record: &Record) -> (String, Vec<Value>) {
    let mut columns = Vec::with_capacity(record.len());
    let mut placeholders = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (ordinal, (name, value)) in record.iter().enumerate() {
        columns.push(style.ident(name));
        placeholders.push(style.placeholder(ordinal + 1));
        params.push(value.clone());
    }
    let sql = format!(
        "insert into {}({}) values({})",
        style.ident(table),
        columns.join(", "),
        placeholders.join(", ")
    );
    (sql, params)
}

pub(crate) fn update_sql(
    style: SqlStyle,
    table: &str,
    keys: &[String],
    ids: &[Value],
    record: &Record,
    is_key: &dyn Fn(&str) -> bool,
) -> (String, Vec<Value>) {
    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for (name, value) in record.iter() {
        if is_key(name) {
            continue;
        }
        assignments.push(format!(
            "{} = {}",
            style.ident(name),
            style.placeholder(params.len() + 1)
        ));
        params.push(value.clone());
    }
    let predicate = style.key_predicate(keys, params.len() + 1);
    params.extend(ids.iter().cloned());
    let sql = format!(
        "update {} set {} where {}",
        style.ident(table),
        assignments.join(", "),
        predicate
    );
    (sql, params)
}

/// LIMIT/OFFSET pagination shared by the MySQL, PostgreSQL and SQLite
/// families.
pub(crate) fn limit_offset_paginate(page_number: u64, page_size: u64, sql: &str) -> String {
    let offset = page_size * (page_number - 1);
    format!("{sql} limit {page_size} offset {offset}")
}
