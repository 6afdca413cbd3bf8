//! Error type for `spoor-archive`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The container has no `persona.json` entry; nothing can be imported.
  #[error("archive is missing persona.json")]
  MissingManifest,

  /// `persona.json` exists but does not parse as a manifest.
  #[error("persona.json is not a valid manifest: {0}")]
  InvalidManifest(#[source] serde_json::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
