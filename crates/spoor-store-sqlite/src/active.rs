//! The active-persona pointer.
//!
//! A single persisted value in the `settings` table names which persona is
//! "current" for capture commands. Reads and writes are best-effort:
//! storage failures are logged and swallowed, never surfaced to callers.
//!
//! The pointer may dangle (name a deleted persona). Consumers resolve it
//! through [`PersonaStore::get_persona`](spoor_core::store::PersonaStore::get_persona)
//! and treat a miss as "no active persona".

use std::sync::Arc;

use rusqlite::OptionalExtension as _;
use tokio::sync::watch;

use crate::SqliteStore;

/// The fixed key in the `settings` table.
pub const ACTIVE_PERSONA_KEY: &str = "active_persona_id";

/// Process-wide observable pointer to the current persona.
///
/// Cloning is cheap; clones share one change channel, so a `set` through
/// any handle is delivered to every subscriber in the process.
#[derive(Clone)]
pub struct ActivePersona {
  conn: tokio_rusqlite::Connection,
  tx:   Arc<watch::Sender<Option<String>>>,
}

impl ActivePersona {
  /// Attach to `store`, reading the persisted value once to seed the
  /// change channel.
  pub async fn load(store: &SqliteStore) -> Self {
    let conn = store.conn.clone();
    let initial = read_pointer(&conn).await;
    let (tx, _rx) = watch::channel(initial);
    Self { conn, tx: Arc::new(tx) }
  }

  /// The currently persisted persona id.
  ///
  /// Unset, empty, or unreadable values all yield `None` — never an error.
  pub async fn get(&self) -> Option<String> { read_pointer(&self.conn).await }

  /// Persist `id` as the active persona and notify subscribers.
  ///
  /// Best-effort: on storage failure the in-process channel still updates.
  pub async fn set(&self, id: &str) {
    let value = normalize(Some(id.to_owned()));

    let id_str = id.to_owned();
    let result = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO settings (key, value) VALUES (?1, ?2)
           ON CONFLICT(key) DO UPDATE SET value = excluded.value",
          rusqlite::params![ACTIVE_PERSONA_KEY, id_str],
        )?;
        Ok(())
      })
      .await;

    if let Err(e) = result {
      tracing::warn!(error = %e, "failed to persist active persona pointer");
    }

    self.tx.send_replace(value);
  }

  /// Subscribe to pointer changes made through any clone of this handle.
  ///
  /// The receiver's initial value is the pointer as of [`load`](Self::load)
  /// or the latest `set`, whichever is newer.
  pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
    self.tx.subscribe()
  }
}

async fn read_pointer(conn: &tokio_rusqlite::Connection) -> Option<String> {
  let result = conn
    .call(|conn| {
      Ok(
        conn
          .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            rusqlite::params![ACTIVE_PERSONA_KEY],
            |row| row.get::<_, String>(0),
          )
          .optional()?,
      )
    })
    .await;

  match result {
    Ok(value) => normalize(value),
    Err(e) => {
      tracing::warn!(error = %e, "failed to read active persona pointer");
      None
    }
  }
}

/// Malformed values (today: the empty string) normalise to absent.
fn normalize(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty())
}
