//! Opaque record identifiers.
//!
//! Ids are stored and exchanged as plain strings: archives omit them, and
//! callers (imports, tests) may supply ids that are not UUIDs. Freshly
//! minted ids are hyphenated UUIDv4 text.

use uuid::Uuid;

/// Mint a new collision-resistant record id.
pub fn new_id() -> String { Uuid::new_v4().hyphenated().to_string() }
