//! Request handlers, one module per resource.

pub mod assets;
pub mod assignments;
pub mod employees;
pub mod requests;
pub mod stats;
