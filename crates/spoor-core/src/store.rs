//! The `PersonaStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `spoor-store-sqlite`).
//! Higher layers (archive export/import, the CLI) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  history::{HistoryEntry, HistoryImport, NewHistory, PageSnapshot},
  insight::{Insight, InsightPatch, NewInsight},
  persona::Persona,
};

/// Abstraction over a spoor record store backend.
///
/// Every multi-step operation (cascade delete, upsert-by-lookup, atomic
/// import, patch-update) executes as one atomic unit: no concurrent read
/// observes an intermediate state. Across separate calls the only conflict
/// resolution is last-write-wins.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait PersonaStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Personas ──────────────────────────────────────────────────────────

  /// Create and persist a new persona; the store allocates the id and
  /// stamps the creation time.
  fn create_persona<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Persona, Self::Error>> + Send + 'a;

  /// Retrieve a persona by id. Returns `None` if not found — the normal
  /// way consumers resolve a possibly-dangling active-persona pointer.
  fn get_persona<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Persona>, Self::Error>> + Send + 'a;

  /// List all personas ordered by creation time ascending.
  fn list_personas(
    &self,
  ) -> impl Future<Output = Result<Vec<Persona>, Self::Error>> + Send + '_;

  /// Overwrite a persona's name in place; id and creation time are
  /// untouched. Fails when the id is absent.
  fn rename_persona<'a>(
    &'a self,
    id: &'a str,
    name: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete a persona and, in the same transaction, every history entry,
  /// page snapshot, and insight it owns.
  fn delete_persona<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── History ───────────────────────────────────────────────────────────

  /// Insert or update the history entry for `(persona_id, url)`.
  ///
  /// An existing entry keeps its id and has every other field overwritten
  /// (`visited_at` included — most recent write wins, not most recent
  /// visit). Returns the stored record.
  fn upsert_history(
    &self,
    input: NewHistory,
  ) -> impl Future<Output = Result<HistoryEntry, Self::Error>> + Send + '_;

  /// All history entries for a persona, most recently visited first.
  fn list_history<'a>(
    &'a self,
    persona_id: &'a str,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + 'a;

  /// Number of history entries for a persona; 0 for an unknown id.
  fn count_history<'a>(
    &'a self,
    persona_id: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Delete a history entry and its snapshot (if any) atomically.
  /// Deleting an absent id is a silent no-op.
  fn delete_history<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Snapshots ─────────────────────────────────────────────────────────

  /// Upsert the snapshot for its history entry; a prior snapshot is
  /// replaced wholesale.
  fn put_snapshot(
    &self,
    snapshot: PageSnapshot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Point lookup; `None` is a normal (non-error) result.
  fn get_snapshot<'a>(
    &'a self,
    history_id: &'a str,
  ) -> impl Future<Output = Result<Option<PageSnapshot>, Self::Error>> + Send + 'a;

  // ── Insights ──────────────────────────────────────────────────────────

  /// Persist a new insight under the given persona.
  fn add_insight<'a>(
    &'a self,
    persona_id: &'a str,
    input: NewInsight,
  ) -> impl Future<Output = Result<Insight, Self::Error>> + Send + 'a;

  /// Apply a partial update to an existing insight and return the stored
  /// result. Fails when the id is absent.
  fn update_insight<'a>(
    &'a self,
    id: &'a str,
    patch: InsightPatch,
  ) -> impl Future<Output = Result<Insight, Self::Error>> + Send + 'a;

  /// Hard delete; a silent no-op when the id is absent.
  fn delete_insight<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// All live (not soft-deleted) insights for a persona, most recently
  /// updated first.
  fn list_insights<'a>(
    &'a self,
    persona_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Insight>, Self::Error>> + Send + 'a;

  // ── Import ────────────────────────────────────────────────────────────

  /// Materialise a parsed archive as a brand-new persona.
  ///
  /// The persona row, all history entries, their snapshots, and all
  /// insights commit in one transaction: a failure mid-import leaves no
  /// partially-populated persona behind. History items follow upsert
  /// semantics within the batch, so duplicate URLs collapse (last wins).
  fn import_persona<'a>(
    &'a self,
    name: &'a str,
    entries: Vec<HistoryImport>,
    insights: Vec<NewInsight>,
  ) -> impl Future<Output = Result<Persona, Self::Error>> + Send + 'a;
}
