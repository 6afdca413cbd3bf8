//! Decoding helpers between raw SQLite rows and Rust domain types.
//!
//! Timestamps are stored as canonical RFC 3339 strings (see
//! [`spoor_core::time`]); closed vocabularies (category, intent) are stored
//! as their wire strings. Encoding happens inline at the write sites via
//! [`spoor_core::time::encode_ts`] and the enums' `Display` impls.

use std::str::FromStr as _;

use spoor_core::{
  history::{HistoryEntry, PageSnapshot},
  insight::{Category, Insight, Intent},
  persona::Persona,
  time::decode_ts,
};

use crate::{Error, Result};

// ─── Closed vocabularies ─────────────────────────────────────────────────────

pub fn decode_category(s: &str) -> Result<Category> {
  Category::from_str(s).map_err(|_| Error::Decode(format!("category {s:?}")))
}

pub fn decode_intent(s: &str) -> Result<Intent> {
  Intent::from_str(s).map_err(|_| Error::Decode(format!("intent {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `personas` row.
pub struct RawPersona {
  pub id:         String,
  pub name:       String,
  pub created_at: String,
}

impl RawPersona {
  pub fn into_persona(self) -> Result<Persona> {
    Ok(Persona {
      id:         self.id,
      name:       self.name,
      created_at: decode_ts(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `history` row.
pub struct RawHistory {
  pub id:          String,
  pub persona_id:  String,
  pub url:         String,
  pub title:       String,
  pub description: String,
  pub visited_at:  String,
}

impl RawHistory {
  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      id:          self.id,
      persona_id:  self.persona_id,
      url:         self.url,
      title:       self.title,
      description: self.description,
      visited_at:  decode_ts(&self.visited_at)?,
    })
  }
}

/// Raw strings read directly from a `page_snapshots` row.
pub struct RawSnapshot {
  pub history_id:  String,
  pub persona_id:  String,
  pub url:         String,
  pub captured_at: String,
  pub html:        String,
}

impl RawSnapshot {
  pub fn into_snapshot(self) -> Result<PageSnapshot> {
    Ok(PageSnapshot {
      history_id:  self.history_id,
      persona_id:  self.persona_id,
      url:         self.url,
      captured_at: decode_ts(&self.captured_at)?,
      html:        self.html,
    })
  }
}

/// Raw values read directly from an `insights` row.
pub struct RawInsight {
  pub id:              String,
  pub persona_id:      String,
  pub insight_summary: String,
  pub category:        String,
  pub intent:          String,
  pub score:           i64,
  pub updated_at:      i64,
  pub is_deleted:      bool,
}

impl RawInsight {
  pub fn into_insight(self) -> Result<Insight> {
    Ok(Insight {
      id:              self.id,
      persona_id:      self.persona_id,
      insight_summary: self.insight_summary,
      category:        decode_category(&self.category)?,
      intent:          decode_intent(&self.intent)?,
      score:           self.score as u8,
      updated_at:      self.updated_at,
      is_deleted:      self.is_deleted,
    })
  }
}
