//! Generic row records and the container factory seam.
//!
//! A `Record` is one database row as an ordered column-name-to-value
//! mapping. Insertion order reflects the first-seen column order, keys
//! are unique, and lookup is exact-match: case sensitivity follows
//! whatever the database reported as the column label.
//!
//! The materializer instantiates records through a [`ContainerFactory`]
//! so embedders can choose how column labels are treated per
//! configuration (verbatim, or folded to lowercase for dialects that
//! report uppercase labels).

use crate::models::value::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One row: an insertion-ordered column-name-to-value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<(String, Value)>,
    fold_keys: bool,
}

impl Record {
    /// Create an empty record with verbatim column labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record that folds every column label to lowercase
    /// on insert and lookup.
    pub fn with_folded_keys() -> Self {
        Self {
            columns: Vec::new(),
            fold_keys: true,
        }
    }

    fn fold(&self, name: &str) -> String {
        if self.fold_keys {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    /// Set a column value. Replaces in place when the column already
    /// exists, preserving its position; otherwise appends. Chainable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = self.fold(&name.into());
        let value = value.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((name, value)),
        }
        self
    }

    /// Get a column value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let name = self.fold(name);
        self.columns.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Check whether a column is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a column, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let name = self.fold(name);
        let idx = self.columns.iter().position(|(n, _)| *n == name)?;
        Some(self.columns.remove(idx).1)
    }

    /// Drop every column holding a null value.
    pub fn remove_null_columns(&mut self) -> &mut Self {
        self.columns.retain(|(_, v)| !v.is_null());
        self
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// (name, value) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Instantiates the record container for each materialized row.
pub trait ContainerFactory: Send + Sync {
    fn new_record(&self) -> Record;
}

/// Default factory: insertion-ordered records with verbatim labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedContainerFactory;

impl ContainerFactory for OrderedContainerFactory {
    fn new_record(&self) -> Record {
        Record::new()
    }
}

/// Factory folding column labels to lowercase, for dialects that report
/// uppercase labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseContainerFactory;

impl ContainerFactory for LowercaseContainerFactory {
    fn new_record(&self) -> Record {
        Record::with_folded_keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let mut record = Record::new();
        record.set("zeta", 1i64).set("alpha", 2i64).set("mid", 3i64);
        let names: Vec<&str> = record.column_names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut record = Record::new();
        record.set("a", 1i64).set("b", 2i64).set("a", 10i64);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some(&Value::BigInt(10)));
        let names: Vec<&str> = record.column_names().collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_lookup_is_case_sensitive_by_default() {
        let mut record = Record::new();
        record.set("Name", "james");
        assert!(record.get("name").is_none());
        assert_eq!(record.get("Name").and_then(Value::as_str), Some("james"));
    }

    #[test]
    fn test_folded_keys() {
        let mut record = Record::with_folded_keys();
        record.set("USER_ID", 15i64);
        assert_eq!(record.get("user_id"), Some(&Value::BigInt(15)));
        assert_eq!(record.get("User_Id"), Some(&Value::BigInt(15)));
    }

    #[test]
    fn test_remove_null_columns() {
        let mut record = Record::new();
        record.set("a", 1i64).set("b", Value::Null).set("c", "x");
        record.remove_null_columns();
        let names: Vec<&str> = record.column_names().collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_serialize_keeps_column_order() {
        let mut record = Record::new();
        record.set("z", 1i64).set("a", "two");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"z":1,"a":"two"}"#);
    }
}
