//! Bundled drivers implementing the engine's connection traits.

pub mod sqlx_any;

pub use sqlx_any::{SqlxConnection, SqlxProvider};
