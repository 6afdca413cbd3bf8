//! Error type for `spoor-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] spoor_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored column held a string outside its closed vocabulary.
  #[error("cannot decode stored value: {0}")]
  Decode(String),

  #[error("persona not found: {0}")]
  PersonaNotFound(String),

  #[error("insight not found: {0}")]
  InsightNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
