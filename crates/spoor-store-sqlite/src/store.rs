//! [`SqliteStore`] — the SQLite implementation of [`PersonaStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use spoor_core::{
  history::{HistoryEntry, HistoryImport, NewHistory, PageSnapshot},
  id::new_id,
  insight::{Insight, InsightPatch, NewInsight},
  persona::Persona,
  store::PersonaStore,
  time::{encode_ts, now_millis},
};

use crate::{
  encode::{RawHistory, RawInsight, RawPersona, RawSnapshot},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A spoor persona store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Every
/// multi-step operation runs inside one `rusqlite` transaction, so a reader
/// on another handle never observes a half-applied cascade or upsert.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PersonaStore impl ───────────────────────────────────────────────────────

impl PersonaStore for SqliteStore {
  type Error = Error;

  // ── Personas ──────────────────────────────────────────────────────────────

  async fn create_persona(&self, name: &str) -> Result<Persona> {
    let persona = Persona {
      id:         new_id(),
      name:       name.to_owned(),
      created_at: Utc::now(),
    };

    let id_str   = persona.id.clone();
    let name_str = persona.name.clone();
    let at_str   = encode_ts(persona.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO personas (id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(persona)
  }

  async fn get_persona(&self, id: &str) -> Result<Option<Persona>> {
    let id_str = id.to_owned();

    let raw: Option<RawPersona> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, name, created_at FROM personas WHERE id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawPersona {
                id:         row.get(0)?,
                name:       row.get(1)?,
                created_at: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPersona::into_persona).transpose()
  }

  async fn list_personas(&self) -> Result<Vec<Persona>> {
    let raws: Vec<RawPersona> = self
      .conn
      .call(|conn| {
        // rowid breaks created_at ties in insertion order, keeping the
        // listing stable for same-millisecond creations.
        let mut stmt = conn.prepare(
          "SELECT id, name, created_at FROM personas
           ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawPersona {
              id:         row.get(0)?,
              name:       row.get(1)?,
              created_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPersona::into_persona).collect()
  }

  async fn rename_persona(&self, id: &str, name: &str) -> Result<()> {
    let id_str   = id.to_owned();
    let name_str = name.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE personas SET name = ?2 WHERE id = ?1",
          rusqlite::params![id_str, name_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::PersonaNotFound(id.to_owned()));
    }
    Ok(())
  }

  async fn delete_persona(&self, id: &str) -> Result<()> {
    let id_str = id.to_owned();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Children first: snapshots and history reference the persona row.
        tx.execute(
          "DELETE FROM page_snapshots WHERE persona_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM history WHERE persona_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM insights WHERE persona_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM personas WHERE id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn upsert_history(&self, input: NewHistory) -> Result<HistoryEntry> {
    // The id used only when no entry exists for the (persona, url) pair.
    let insert_id   = input.id.clone().unwrap_or_else(new_id);
    let persona_id  = input.persona_id.clone();
    let url         = input.url.clone();
    let title       = input.title.clone();
    let description = input.description.clone();
    let visited_str = encode_ts(input.visited_at);

    let stored_id: String = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
          .query_row(
            "SELECT id FROM history WHERE persona_id = ?1 AND url = ?2",
            rusqlite::params![persona_id, url],
            |row| row.get(0),
          )
          .optional()?;

        let id = match existing {
          Some(id) => {
            tx.execute(
              "UPDATE history SET title = ?2, description = ?3, visited_at = ?4
               WHERE id = ?1",
              rusqlite::params![id, title, description, visited_str],
            )?;
            id
          }
          None => {
            tx.execute(
              "INSERT INTO history (id, persona_id, url, title, description, visited_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
              rusqlite::params![
                insert_id,
                persona_id,
                url,
                title,
                description,
                visited_str,
              ],
            )?;
            insert_id
          }
        };

        tx.commit()?;
        Ok(id)
      })
      .await?;

    Ok(HistoryEntry {
      id:          stored_id,
      persona_id:  input.persona_id,
      url:         input.url,
      title:       input.title,
      description: input.description,
      visited_at:  input.visited_at,
    })
  }

  async fn list_history(&self, persona_id: &str) -> Result<Vec<HistoryEntry>> {
    let persona_str = persona_id.to_owned();

    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, persona_id, url, title, description, visited_at
           FROM history WHERE persona_id = ?1
           ORDER BY visited_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![persona_str], |row| {
            Ok(RawHistory {
              id:          row.get(0)?,
              persona_id:  row.get(1)?,
              url:         row.get(2)?,
              title:       row.get(3)?,
              description: row.get(4)?,
              visited_at:  row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistory::into_entry).collect()
  }

  async fn count_history(&self, persona_id: &str) -> Result<u64> {
    let persona_str = persona_id.to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM history WHERE persona_id = ?1",
          rusqlite::params![persona_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }

  async fn delete_history(&self, id: &str) -> Result<()> {
    let id_str = id.to_owned();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Snapshot first — it references the history row.
        tx.execute(
          "DELETE FROM page_snapshots WHERE history_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM history WHERE id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  // ── Snapshots ─────────────────────────────────────────────────────────────

  async fn put_snapshot(&self, snapshot: PageSnapshot) -> Result<()> {
    let captured_str = encode_ts(snapshot.captured_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO page_snapshots
             (history_id, persona_id, url, captured_at, html)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            snapshot.history_id,
            snapshot.persona_id,
            snapshot.url,
            captured_str,
            snapshot.html,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn get_snapshot(&self, history_id: &str) -> Result<Option<PageSnapshot>> {
    let id_str = history_id.to_owned();

    let raw: Option<RawSnapshot> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT history_id, persona_id, url, captured_at, html
             FROM page_snapshots WHERE history_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawSnapshot {
                history_id:  row.get(0)?,
                persona_id:  row.get(1)?,
                url:         row.get(2)?,
                captured_at: row.get(3)?,
                html:        row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSnapshot::into_snapshot).transpose()
  }

  // ── Insights ──────────────────────────────────────────────────────────────

  async fn add_insight(
    &self,
    persona_id: &str,
    input: NewInsight,
  ) -> Result<Insight> {
    let insight = Insight {
      id:              input.id.unwrap_or_else(new_id),
      persona_id:      persona_id.to_owned(),
      insight_summary: input.insight_summary,
      category:        input.category,
      intent:          input.intent,
      score:           input.score,
      updated_at:      input.updated_at.unwrap_or_else(now_millis),
      is_deleted:      input.is_deleted.unwrap_or(false),
    };

    let id_str       = insight.id.clone();
    let persona_str  = insight.persona_id.clone();
    let summary_str  = insight.insight_summary.clone();
    let category_str = insight.category.to_string();
    let intent_str   = insight.intent.to_string();
    let score_val    = i64::from(insight.score);
    let updated_val  = insight.updated_at;
    let deleted_val  = insight.is_deleted;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO insights
             (id, persona_id, insight_summary, category, intent, score, updated_at, is_deleted)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            persona_str,
            summary_str,
            category_str,
            intent_str,
            score_val,
            updated_val,
            deleted_val,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(insight)
  }

  async fn update_insight(
    &self,
    id: &str,
    patch: InsightPatch,
  ) -> Result<Insight> {
    let id_str       = id.to_owned();
    let summary_str  = patch.insight_summary;
    let category_str = patch.category.map(|c| c.to_string());
    let intent_str   = patch.intent.map(|i| i.to_string());
    let score_val    = patch.score.map(i64::from);
    let deleted_val  = patch.is_deleted;
    let updated_val  = patch.updated_at.unwrap_or_else(now_millis);

    let raw: Option<RawInsight> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // NULL patch fields fall back to the stored column via COALESCE,
        // so the merge happens inside the transaction without a read-
        // modify-write round trip.
        let changed = tx.execute(
          "UPDATE insights SET
             insight_summary = COALESCE(?2, insight_summary),
             category        = COALESCE(?3, category),
             intent          = COALESCE(?4, intent),
             score           = COALESCE(?5, score),
             is_deleted      = COALESCE(?6, is_deleted),
             updated_at      = ?7
           WHERE id = ?1",
          rusqlite::params![
            id_str,
            summary_str,
            category_str,
            intent_str,
            score_val,
            deleted_val,
            updated_val,
          ],
        )?;

        if changed == 0 {
          return Ok(None);
        }

        let raw = tx.query_row(
          "SELECT id, persona_id, insight_summary, category, intent, score, updated_at, is_deleted
           FROM insights WHERE id = ?1",
          rusqlite::params![id_str],
          |row| {
            Ok(RawInsight {
              id:              row.get(0)?,
              persona_id:      row.get(1)?,
              insight_summary: row.get(2)?,
              category:        row.get(3)?,
              intent:          row.get(4)?,
              score:           row.get(5)?,
              updated_at:      row.get(6)?,
              is_deleted:      row.get(7)?,
            })
          },
        )?;

        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    match raw {
      Some(raw) => raw.into_insight(),
      None => Err(Error::InsightNotFound(id.to_owned())),
    }
  }

  async fn delete_insight(&self, id: &str) -> Result<()> {
    let id_str = id.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM insights WHERE id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn list_insights(&self, persona_id: &str) -> Result<Vec<Insight>> {
    let persona_str = persona_id.to_owned();

    let raws: Vec<RawInsight> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, persona_id, insight_summary, category, intent, score, updated_at, is_deleted
           FROM insights
           WHERE persona_id = ?1 AND is_deleted = 0
           ORDER BY updated_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![persona_str], |row| {
            Ok(RawInsight {
              id:              row.get(0)?,
              persona_id:      row.get(1)?,
              insight_summary: row.get(2)?,
              category:        row.get(3)?,
              intent:          row.get(4)?,
              score:           row.get(5)?,
              updated_at:      row.get(6)?,
              is_deleted:      row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInsight::into_insight).collect()
  }

  // ── Import ────────────────────────────────────────────────────────────────

  async fn import_persona(
    &self,
    name: &str,
    entries: Vec<HistoryImport>,
    insights: Vec<NewInsight>,
  ) -> Result<Persona> {
    let persona = Persona {
      id:         new_id(),
      name:       name.to_owned(),
      created_at: Utc::now(),
    };

    // Pre-encode everything so the closure only touches SQLite.
    struct EncodedEntry {
      id:          String,
      url:         String,
      title:       String,
      description: String,
      visited:     String,
      html:        Option<String>,
    }

    let entries: Vec<EncodedEntry> = entries
      .into_iter()
      .map(|e| EncodedEntry {
        id:          new_id(),
        url:         e.url,
        title:       e.title,
        description: e.description,
        visited:     encode_ts(e.visited_at),
        html:        e.html.filter(|h| !h.is_empty()),
      })
      .collect();

    struct EncodedInsight {
      id:         String,
      summary:    String,
      category:   String,
      intent:     String,
      score:      i64,
      updated_at: i64,
      is_deleted: bool,
    }

    let insights: Vec<EncodedInsight> = insights
      .into_iter()
      .map(|i| EncodedInsight {
        id:         i.id.unwrap_or_else(new_id),
        summary:    i.insight_summary,
        category:   i.category.to_string(),
        intent:     i.intent.to_string(),
        score:      i64::from(i.score),
        updated_at: i.updated_at.unwrap_or_else(now_millis),
        is_deleted: i.is_deleted.unwrap_or(false),
      })
      .collect();

    let persona_id  = persona.id.clone();
    let name_str    = persona.name.clone();
    let created_str = encode_ts(persona.created_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO personas (id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![persona_id, name_str, created_str],
        )?;

        for entry in &entries {
          // Upsert within the batch: a duplicate URL in the archive
          // collapses onto the earlier row, last write winning.
          let existing: Option<String> = tx
            .query_row(
              "SELECT id FROM history WHERE persona_id = ?1 AND url = ?2",
              rusqlite::params![persona_id, entry.url],
              |row| row.get(0),
            )
            .optional()?;

          let history_id = match existing {
            Some(id) => {
              tx.execute(
                "UPDATE history SET title = ?2, description = ?3, visited_at = ?4
                 WHERE id = ?1",
                rusqlite::params![id, entry.title, entry.description, entry.visited],
              )?;
              id
            }
            None => {
              tx.execute(
                "INSERT INTO history (id, persona_id, url, title, description, visited_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                  entry.id,
                  persona_id,
                  entry.url,
                  entry.title,
                  entry.description,
                  entry.visited,
                ],
              )?;
              entry.id.clone()
            }
          };

          if let Some(html) = &entry.html {
            // The archive manifest carries no capture time; the recorded
            // visit time stands in for it.
            tx.execute(
              "INSERT OR REPLACE INTO page_snapshots
                 (history_id, persona_id, url, captured_at, html)
               VALUES (?1, ?2, ?3, ?4, ?5)",
              rusqlite::params![history_id, persona_id, entry.url, entry.visited, html],
            )?;
          }
        }

        for insight in &insights {
          tx.execute(
            "INSERT INTO insights
               (id, persona_id, insight_summary, category, intent, score, updated_at, is_deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
              insight.id,
              persona_id,
              insight.summary,
              insight.category,
              insight.intent,
              insight.score,
              insight.updated_at,
              insight.is_deleted,
            ],
          )?;
        }

        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(persona)
  }
}
