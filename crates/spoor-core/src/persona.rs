//! Persona — the root entity that owns a browsing trail.
//!
//! A persona holds only identity metadata. History, snapshots, and insights
//! are owned by and lifetime-bound to it; deleting a persona cascades.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named browsing profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
  pub id:         String,
  pub name:       String,
  #[serde(with = "crate::time::serde_ts")]
  pub created_at: DateTime<Utc>,
}
