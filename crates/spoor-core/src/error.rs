//! Error types for `spoor-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A persisted timestamp string is not valid RFC 3339.
  #[error("invalid timestamp: {0}")]
  Timestamp(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
