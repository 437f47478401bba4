//! Database access engine.
//!
//! This module composes the execution-path components:
//! - Driver-facing connection traits
//! - Statement execution
//! - Result materialization
//! - Pagination arithmetic
//! - CRUD orchestration with generated-key retrieval
//! - Chunked batch execution

pub mod connection;
pub mod engine;

mod batch;
mod crud;
mod executor;
mod materialize;
mod paginate;

pub use connection::{
    Connection, ConnectionProvider, KeyRetrieval, MaterializedRows, RawBatch, Rows, Statement,
};
pub use engine::Db;
