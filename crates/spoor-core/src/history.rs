//! History entries and page snapshots.
//!
//! A history entry records one visited URL per persona: the store keeps at
//! most one entry per `(persona_id, url)` pair and upserts in place. A page
//! snapshot is the captured HTML body for one history entry, replaced
//! wholesale on re-capture.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One visited URL in a persona's browsing trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub id:          String,
  pub persona_id:  String,
  pub url:         String,
  pub title:       String,
  pub description: String,
  #[serde(with = "crate::time::serde_ts")]
  pub visited_at:  DateTime<Utc>,
}

/// Input to [`crate::store::PersonaStore::upsert_history`].
#[derive(Debug, Clone)]
pub struct NewHistory {
  pub persona_id:  String,
  pub url:         String,
  pub title:       String,
  pub description: String,
  pub visited_at:  DateTime<Utc>,
  /// Caller-supplied id, honoured only when no entry exists for the
  /// `(persona_id, url)` pair; an existing entry always keeps its id.
  pub id:          Option<String>,
}

/// The captured full-page HTML for one history entry.
///
/// `persona_id` is denormalised so the store can cascade-delete snapshots
/// by persona without joining through `history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
  pub history_id:  String,
  pub persona_id:  String,
  pub url:         String,
  #[serde(with = "crate::time::serde_ts")]
  pub captured_at: DateTime<Utc>,
  pub html:        String,
}

/// One history item of an archive import batch, with its optional snapshot
/// body. Input to [`crate::store::PersonaStore::import_persona`].
#[derive(Debug, Clone)]
pub struct HistoryImport {
  pub url:         String,
  pub title:       String,
  pub description: String,
  pub visited_at:  DateTime<Utc>,
  pub html:        Option<String>,
}
