//! SQLite backend for the NavOptima warehouse.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The star schema lives in an attached
//! database named [`SCHEMA_NAME`].

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::SCHEMA_NAME;
pub use store::SqliteWarehouse;

#[cfg(test)]
mod tests;
