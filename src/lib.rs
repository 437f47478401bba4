//! dbrow — generic relational-database access engine.
//!
//! Executes parameterized SQL against a pluggable database dialect,
//! materializes results into dialect-agnostic ordered records, and
//! provides transaction-safe batch execution with bounded chunking.
//! Connections, SQL generation and row containers are consumed through
//! capability traits; reference implementations ship for the common
//! database families and a sqlx-backed driver.

pub mod config;
pub mod db;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod models;

pub use config::{DbConfig, DbConfigBuilder, Registry};
pub use db::Db;
pub use error::{DbError, DbResult};
pub use models::{Page, PrimaryKey, QueryRows, Record, Value};
