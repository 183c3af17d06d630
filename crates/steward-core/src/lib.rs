//! Core types and trait definitions for the Steward asset-management backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod affiliation;
pub mod asset;
pub mod assignment;
pub mod engine;
pub mod error;
pub mod identity;
pub mod request;
pub mod store;

pub use error::{Error, Result};
