//! Insights — free-form tagged notes attached to a persona.
//!
//! Category and intent are closed vocabularies; their wire strings (serde,
//! SQLite columns, archive manifests) are identical, so the strum and serde
//! spellings below must stay in lockstep.

use serde::{Deserialize, Serialize};

// ─── Closed vocabularies ─────────────────────────────────────────────────────

/// Topic classification for an insight.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::VariantNames,
)]
pub enum Category {
  #[serde(rename = "arts/entertainment")]
  #[strum(serialize = "arts/entertainment")]
  ArtsEntertainment,
  #[serde(rename = "autos")]
  #[strum(serialize = "autos")]
  Autos,
  #[serde(rename = "beauty/fitness")]
  #[strum(serialize = "beauty/fitness")]
  BeautyFitness,
  #[serde(rename = "books")]
  #[strum(serialize = "books")]
  Books,
  #[serde(rename = "business")]
  #[strum(serialize = "business")]
  Business,
  #[serde(rename = "computers")]
  #[strum(serialize = "computers")]
  Computers,
  #[serde(rename = "food")]
  #[strum(serialize = "food")]
  Food,
  #[serde(rename = "games")]
  #[strum(serialize = "games")]
  Games,
  #[serde(rename = "hobbies")]
  #[strum(serialize = "hobbies")]
  Hobbies,
  #[serde(rename = "home/garden")]
  #[strum(serialize = "home/garden")]
  HomeGarden,
  #[serde(rename = "internet")]
  #[strum(serialize = "internet")]
  Internet,
  #[serde(rename = "jobs/education")]
  #[strum(serialize = "jobs/education")]
  JobsEducation,
  #[serde(rename = "law/government")]
  #[strum(serialize = "law/government")]
  LawGovernment,
  #[serde(rename = "news")]
  #[strum(serialize = "news")]
  News,
  #[serde(rename = "online-communities")]
  #[strum(serialize = "online-communities")]
  OnlineCommunities,
  #[serde(rename = "people/society")]
  #[strum(serialize = "people/society")]
  PeopleSociety,
  #[serde(rename = "pets")]
  #[strum(serialize = "pets")]
  Pets,
  #[serde(rename = "real-estate")]
  #[strum(serialize = "real-estate")]
  RealEstate,
  #[serde(rename = "reference")]
  #[strum(serialize = "reference")]
  Reference,
  #[serde(rename = "science")]
  #[strum(serialize = "science")]
  Science,
  #[serde(rename = "shopping")]
  #[strum(serialize = "shopping")]
  Shopping,
  #[serde(rename = "sports")]
  #[strum(serialize = "sports")]
  Sports,
  #[serde(rename = "travel")]
  #[strum(serialize = "travel")]
  Travel,
}

/// What the user was trying to do when the insight was recorded.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::VariantNames,
)]
pub enum Intent {
  #[serde(rename = "research/learn")]
  #[strum(serialize = "research/learn")]
  ResearchLearn,
  #[serde(rename = "compare/evaluate")]
  #[strum(serialize = "compare/evaluate")]
  CompareEvaluate,
  #[serde(rename = "plan/organize")]
  #[strum(serialize = "plan/organize")]
  PlanOrganize,
  #[serde(rename = "buy/acquire")]
  #[strum(serialize = "buy/acquire")]
  BuyAcquire,
  #[serde(rename = "create/produce")]
  #[strum(serialize = "create/produce")]
  CreateProduce,
  #[serde(rename = "communicate/share")]
  #[strum(serialize = "communicate/share")]
  CommunicateShare,
  #[serde(rename = "monitor/track")]
  #[strum(serialize = "monitor/track")]
  MonitorTrack,
  #[serde(rename = "entertain/relax")]
  #[strum(serialize = "entertain/relax")]
  EntertainRelax,
  #[serde(rename = "resume/revisit")]
  #[strum(serialize = "resume/revisit")]
  ResumeRevisit,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A stored insight note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
  pub id:              String,
  pub persona_id:      String,
  pub insight_summary: String,
  pub category:        Category,
  pub intent:          Intent,
  /// Relevance score, 1 (low) to 5 (high).
  pub score:           u8,
  /// Epoch milliseconds; re-stamped on every update.
  pub updated_at:      i64,
  /// Soft-delete marker. Soft-deleted insights are excluded from list
  /// reads and exports but stay in the table until hard-deleted.
  pub is_deleted:      bool,
}

/// Input to [`crate::store::PersonaStore::add_insight`].
#[derive(Debug, Clone)]
pub struct NewInsight {
  pub insight_summary: String,
  pub category:        Category,
  pub intent:          Intent,
  pub score:           u8,
  /// Defaults to now when not supplied.
  pub updated_at:      Option<i64>,
  /// Defaults to `false` when not supplied.
  pub is_deleted:      Option<bool>,
  /// Caller-supplied id; a fresh one is minted when absent.
  pub id:              Option<String>,
}

impl NewInsight {
  /// Convenience constructor with all optional fields unset.
  pub fn new(
    insight_summary: impl Into<String>,
    category: Category,
    intent: Intent,
    score: u8,
  ) -> Self {
    Self {
      insight_summary: insight_summary.into(),
      category,
      intent,
      score,
      updated_at: None,
      is_deleted: None,
      id: None,
    }
  }
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A partial update for [`crate::store::PersonaStore::update_insight`].
///
/// Each field overwrites the stored value only when set; the schema cannot
/// widen through an update. `updated_at` is re-stamped to the time of the
/// update unless the patch carries an explicit value.
#[derive(Debug, Clone, Default)]
pub struct InsightPatch {
  pub insight_summary: Option<String>,
  pub category:        Option<Category>,
  pub intent:          Option<Intent>,
  pub score:           Option<u8>,
  pub updated_at:      Option<i64>,
  pub is_deleted:      Option<bool>,
}
