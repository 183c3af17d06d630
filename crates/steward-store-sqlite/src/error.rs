//! Error type for `steward-store-sqlite`.

use steward_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown status value: {0:?}")]
  UnknownStatus(String),
}

impl From<Error> for StoreError {
  fn from(e: Error) -> Self {
    StoreError::backend(e)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
