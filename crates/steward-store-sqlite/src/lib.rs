//! SQLite backend for the Steward asset store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. SQLite's single-writer execution
//! makes the conditional UPDATEs used for reservation and state transitions
//! atomic with respect to concurrent callers.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
