//! The `persona.json` manifest.
//!
//! Field sets and field order are a byte-level contract: identical inputs
//! must serialise to an identical pretty-printed document, and `id` /
//! `personaId` never leave the store. Deserialisation is tolerant the way
//! the parse rules require — missing `history`/`insights` arrays default to
//! empty and `persona` may be absent entirely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use spoor_core::{
  history::HistoryEntry,
  insight::{Category, Insight, Intent},
  persona::Persona,
};

use crate::path::snapshot_path;

/// Top-level document stored as `persona.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
  #[serde(default)]
  pub persona:  Option<ManifestPersona>,
  #[serde(default)]
  pub history:  Vec<ManifestHistory>,
  #[serde(default)]
  pub insights: Vec<ManifestInsight>,
}

/// Persona metadata without its store id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestPersona {
  #[serde(default)]
  pub name:       String,
  #[serde(
    rename = "createdAt",
    with = "spoor_core::time::serde_ts_opt",
    default
  )]
  pub created_at: Option<DateTime<Utc>>,
}

/// One history item; `id` and `personaId` are omitted by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestHistory {
  #[serde(default)]
  pub url:           String,
  #[serde(default)]
  pub title:         String,
  #[serde(default)]
  pub description:   String,
  #[serde(
    rename = "visitedAt",
    with = "spoor_core::time::serde_ts_opt",
    default
  )]
  pub visited_at:    Option<DateTime<Utc>>,
  /// `"./" + snapshot_path(url)`; the body may or may not exist in the
  /// container.
  #[serde(rename = "snapshotPath", default)]
  pub snapshot_path: Option<String>,
}

/// One insight; `id` and `personaId` are omitted by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestInsight {
  pub insight_summary: String,
  pub category:        Category,
  pub intent:          Intent,
  pub score:           u8,
  pub updated_at:      i64,
  pub is_deleted:      bool,
}

impl Manifest {
  /// Build the export manifest for a persona's gathered dataset.
  pub fn for_export(
    persona: &Persona,
    entries: &[HistoryEntry],
    insights: &[Insight],
  ) -> Self {
    Self {
      persona:  Some(ManifestPersona {
        name:       persona.name.clone(),
        created_at: Some(persona.created_at),
      }),
      history:  entries
        .iter()
        .map(|entry| ManifestHistory {
          url:           entry.url.clone(),
          title:         entry.title.clone(),
          description:   entry.description.clone(),
          visited_at:    Some(entry.visited_at),
          snapshot_path: Some(format!("./{}", snapshot_path(&entry.url))),
        })
        .collect(),
      insights: insights
        .iter()
        .map(|insight| ManifestInsight {
          insight_summary: insight.insight_summary.clone(),
          category:        insight.category,
          intent:          insight.intent,
          score:           insight.score,
          updated_at:      insight.updated_at,
          is_deleted:      insight.is_deleted,
        })
        .collect(),
    }
  }
}
