//! Primary key specifications.
//!
//! A `PrimaryKey` is an explicit ordered list of key column names,
//! constructed once and validated at orchestration time instead of being
//! re-split from a comma string on every call.

use crate::error::{DbError, DbResult};
use crate::models::value::Value;

/// Ordered primary key column list. Composite keys hold more than one
/// column; the order is the order generated keys are read back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    columns: Vec<String>,
}

impl PrimaryKey {
    /// Build from an explicit column list. Names are trimmed; an empty
    /// list or a blank name is a precondition error.
    pub fn new<I, S>(columns: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|c| c.into().trim().to_string())
            .collect();
        if columns.is_empty() {
            return Err(DbError::precondition("primary key needs at least one column"));
        }
        if columns.iter().any(String::is_empty) {
            return Err(DbError::precondition("primary key column name is blank"));
        }
        Ok(Self { columns })
    }

    /// Parse a comma-separated specification, e.g. `"user_id, role_id"`.
    /// Each name is trimmed of surrounding whitespace.
    pub fn parse(spec: &str) -> DbResult<Self> {
        Self::new(spec.split(','))
    }

    /// A single-column key.
    pub fn single(column: impl Into<String>) -> Self {
        Self {
            columns: vec![column.into().trim().to_string()],
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }

    /// Validate that the supplied id values match the key column count.
    /// A mismatch is a precondition violation, raised before any
    /// statement is prepared.
    pub fn expect_ids(&self, ids: &[Value]) -> DbResult<()> {
        if self.columns.len() != ids.len() {
            return Err(DbError::precondition(format!(
                "primary key column count ({}) must equal id value count ({})",
                self.columns.len(),
                ids.len()
            )));
        }
        Ok(())
    }
}
