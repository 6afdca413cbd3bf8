//! Portable archive codec for spoor personas.
//!
//! A persona's entire dataset round-trips through a single zip container:
//! a `persona.json` manifest plus one `snapshot/<host>/<path>.html` entry
//! per captured page. Building and parsing are pure over byte buffers —
//! gathering records beforehand and materialising them afterwards is the
//! caller's job, so this crate never touches a store.

mod codec;
mod manifest;
mod path;

pub mod error;

pub use codec::{
  build_archive, build_manifest_json, parse_archive, ExportEntry,
  ParsedArchive, ParsedEntry,
};
pub use error::{Error, Result};
pub use manifest::{Manifest, ManifestHistory, ManifestInsight, ManifestPersona};
pub use path::{sanitize_segment, snapshot_path};
