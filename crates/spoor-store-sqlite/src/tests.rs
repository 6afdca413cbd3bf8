//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Utc};
use spoor_core::{
  history::{HistoryImport, NewHistory, PageSnapshot},
  insight::{Category, InsightPatch, Intent, NewInsight},
  store::PersonaStore,
  time::decode_ts,
};

use crate::{ActivePersona, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn ts(s: &str) -> DateTime<Utc> { decode_ts(s).expect("test timestamp") }

fn visit(persona_id: &str, url: &str, title: &str, at: &str) -> NewHistory {
  NewHistory {
    persona_id:  persona_id.to_owned(),
    url:         url.to_owned(),
    title:       title.to_owned(),
    description: String::new(),
    visited_at:  ts(at),
    id:          None,
  }
}

fn snapshot(entry_id: &str, persona_id: &str, url: &str, html: &str) -> PageSnapshot {
  PageSnapshot {
    history_id:  entry_id.to_owned(),
    persona_id:  persona_id.to_owned(),
    url:         url.to_owned(),
    captured_at: ts("2024-03-01T10:00:00.000Z"),
    html:        html.to_owned(),
  }
}

fn note(summary: &str) -> NewInsight {
  NewInsight::new(summary, Category::Science, Intent::ResearchLearn, 3)
}

/// Direct row count, bypassing the store API.
async fn rows_for(s: &SqliteStore, table: &str, column: &str, id: &str) -> i64 {
  let sql = format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1");
  let id = id.to_owned();
  s.conn
    .call(move |conn| {
      Ok(conn.query_row(&sql, rusqlite::params![id], |row| row.get(0))?)
    })
    .await
    .unwrap()
}

async fn total_rows(s: &SqliteStore, table: &str) -> i64 {
  let sql = format!("SELECT COUNT(*) FROM {table}");
  s.conn
    .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
    .await
    .unwrap()
}

// ─── Personas ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_persona() {
  let s = store().await;

  let persona = s.create_persona("Work").await.unwrap();
  assert_eq!(persona.name, "Work");

  let fetched = s.get_persona(&persona.id).await.unwrap().unwrap();
  assert_eq!(fetched.id, persona.id);
  assert_eq!(fetched.name, "Work");
}

#[tokio::test]
async fn get_persona_missing_returns_none() {
  let s = store().await;
  assert!(s.get_persona("no-such-id").await.unwrap().is_none());
}

#[tokio::test]
async fn list_personas_ordered_by_creation() {
  let s = store().await;
  s.create_persona("first").await.unwrap();
  s.create_persona("second").await.unwrap();
  s.create_persona("third").await.unwrap();

  let all = s.list_personas().await.unwrap();
  assert_eq!(all.len(), 3);
  let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
  assert_eq!(names, ["first", "second", "third"]);
}

#[tokio::test]
async fn rename_persona_keeps_id_and_created_at() {
  let s = store().await;
  let persona = s.create_persona("before").await.unwrap();

  s.rename_persona(&persona.id, "after").await.unwrap();

  let fetched = s.get_persona(&persona.id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "after");
  assert_eq!(fetched.id, persona.id);
  // created_at survives at millisecond precision.
  assert_eq!(
    fetched.created_at.timestamp_millis(),
    persona.created_at.timestamp_millis()
  );
}

#[tokio::test]
async fn rename_missing_persona_errors() {
  let s = store().await;
  let err = s.rename_persona("ghost", "anything").await.unwrap_err();
  assert!(matches!(err, crate::Error::PersonaNotFound(_)));
}

#[tokio::test]
async fn delete_persona_cascades_all_collections() {
  let s = store().await;
  let doomed = s.create_persona("doomed").await.unwrap();
  let kept = s.create_persona("kept").await.unwrap();

  for (persona, url) in [(&doomed, "https://a.example/x"), (&kept, "https://b.example/y")] {
    let entry = s
      .upsert_history(visit(&persona.id, url, "page", "2024-02-01T00:00:00.000Z"))
      .await
      .unwrap();
    s.put_snapshot(snapshot(&entry.id, &persona.id, url, "<p>body</p>"))
      .await
      .unwrap();
    s.add_insight(&persona.id, note("kept around")).await.unwrap();
  }

  s.delete_persona(&doomed.id).await.unwrap();

  // Direct scans: nothing referencing the deleted persona survives.
  assert_eq!(rows_for(&s, "personas", "id", &doomed.id).await, 0);
  assert_eq!(rows_for(&s, "history", "persona_id", &doomed.id).await, 0);
  assert_eq!(rows_for(&s, "page_snapshots", "persona_id", &doomed.id).await, 0);
  assert_eq!(rows_for(&s, "insights", "persona_id", &doomed.id).await, 0);

  // The sibling persona is untouched.
  assert_eq!(rows_for(&s, "history", "persona_id", &kept.id).await, 1);
  assert_eq!(rows_for(&s, "page_snapshots", "persona_id", &kept.id).await, 1);
  assert_eq!(rows_for(&s, "insights", "persona_id", &kept.id).await, 1);
}

// ─── History upsert ──────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_same_pair_updates_in_place() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();
  let url = "https://example.com/article";

  let first = s
    .upsert_history(visit(&persona.id, url, "First title", "2024-01-01T00:00:00.000Z"))
    .await
    .unwrap();
  let second = s
    .upsert_history(visit(&persona.id, url, "Second title", "2024-01-05T00:00:00.000Z"))
    .await
    .unwrap();

  // Same row: the id survives, the fields are the second write's.
  assert_eq!(second.id, first.id);
  assert_eq!(rows_for(&s, "history", "persona_id", &persona.id).await, 1);

  let listed = s.list_history(&persona.id).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].title, "Second title");
  assert_eq!(listed[0].visited_at, ts("2024-01-05T00:00:00.000Z"));
}

#[tokio::test]
async fn upsert_honours_caller_supplied_id_on_insert() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();

  let mut input = visit(&persona.id, "https://example.com/", "Home", "2024-01-01T00:00:00.000Z");
  input.id = Some("visit-1".to_owned());

  let entry = s.upsert_history(input).await.unwrap();
  assert_eq!(entry.id, "visit-1");
}

#[tokio::test]
async fn upsert_distinct_urls_create_distinct_entries() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();

  s.upsert_history(visit(&persona.id, "https://example.com/a", "A", "2024-01-01T00:00:00.000Z"))
    .await
    .unwrap();
  s.upsert_history(visit(&persona.id, "https://example.com/b", "B", "2024-01-02T00:00:00.000Z"))
    .await
    .unwrap();

  assert_eq!(s.count_history(&persona.id).await.unwrap(), 2);
}

#[tokio::test]
async fn same_url_under_two_personas_stays_separate() {
  let s = store().await;
  let one = s.create_persona("one").await.unwrap();
  let two = s.create_persona("two").await.unwrap();
  let url = "https://example.com/shared";

  s.upsert_history(visit(&one.id, url, "One", "2024-01-01T00:00:00.000Z"))
    .await
    .unwrap();
  s.upsert_history(visit(&two.id, url, "Two", "2024-01-01T00:00:00.000Z"))
    .await
    .unwrap();

  assert_eq!(s.count_history(&one.id).await.unwrap(), 1);
  assert_eq!(s.count_history(&two.id).await.unwrap(), 1);
}

#[tokio::test]
async fn list_history_most_recent_first() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();

  s.upsert_history(visit(&persona.id, "https://example.com/old", "Old", "2024-01-01T00:00:00.000Z"))
    .await
    .unwrap();
  s.upsert_history(visit(&persona.id, "https://example.com/new", "New", "2024-03-01T00:00:00.000Z"))
    .await
    .unwrap();
  s.upsert_history(visit(&persona.id, "https://example.com/mid", "Mid", "2024-02-01T00:00:00.000Z"))
    .await
    .unwrap();

  let titles: Vec<_> = s
    .list_history(&persona.id)
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.title)
    .collect();
  assert_eq!(titles, ["New", "Mid", "Old"]);
}

#[tokio::test]
async fn count_history_unknown_persona_is_zero() {
  let s = store().await;
  assert_eq!(s.count_history("nobody").await.unwrap(), 0);
}

#[tokio::test]
async fn delete_history_removes_snapshot_and_is_idempotent() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();
  let entry = s
    .upsert_history(visit(&persona.id, "https://example.com/", "Home", "2024-01-01T00:00:00.000Z"))
    .await
    .unwrap();
  s.put_snapshot(snapshot(&entry.id, &persona.id, &entry.url, "<p>x</p>"))
    .await
    .unwrap();

  s.delete_history(&entry.id).await.unwrap();

  assert_eq!(s.count_history(&persona.id).await.unwrap(), 0);
  assert!(s.get_snapshot(&entry.id).await.unwrap().is_none());

  // Deleting again is a silent no-op.
  s.delete_history(&entry.id).await.unwrap();
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_snapshot_twice_keeps_second_body() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();
  let entry = s
    .upsert_history(visit(&persona.id, "https://example.com/", "Home", "2024-01-01T00:00:00.000Z"))
    .await
    .unwrap();

  s.put_snapshot(snapshot(&entry.id, &persona.id, &entry.url, "<p>first</p>"))
    .await
    .unwrap();
  s.put_snapshot(snapshot(&entry.id, &persona.id, &entry.url, "<p>second</p>"))
    .await
    .unwrap();

  assert_eq!(rows_for(&s, "page_snapshots", "history_id", &entry.id).await, 1);
  let stored = s.get_snapshot(&entry.id).await.unwrap().unwrap();
  assert_eq!(stored.html, "<p>second</p>");
}

#[tokio::test]
async fn get_snapshot_absent_returns_none() {
  let s = store().await;
  assert!(s.get_snapshot("never-captured").await.unwrap().is_none());
}

// ─── Insights ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_insight_fills_defaults() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();

  let before = spoor_core::time::now_millis();
  let insight = s.add_insight(&persona.id, note("rust ownership")).await.unwrap();

  assert!(!insight.id.is_empty());
  assert_eq!(insight.persona_id, persona.id);
  assert!(!insight.is_deleted);
  assert!(insight.updated_at >= before);
}

#[tokio::test]
async fn add_insight_honours_supplied_fields() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();

  let mut input = note("pre-stamped");
  input.id = Some("insight-1".to_owned());
  input.updated_at = Some(1_700_000_000_000);

  let insight = s.add_insight(&persona.id, input).await.unwrap();
  assert_eq!(insight.id, "insight-1");
  assert_eq!(insight.updated_at, 1_700_000_000_000);
}

#[tokio::test]
async fn update_insight_merges_and_restamps() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();

  let mut input = note("original summary");
  input.updated_at = Some(1_000);
  let insight = s.add_insight(&persona.id, input).await.unwrap();

  let patched = s
    .update_insight(&insight.id, InsightPatch {
      score: Some(5),
      ..Default::default()
    })
    .await
    .unwrap();

  // Patched field applied, untouched fields survive, timestamp restamped.
  assert_eq!(patched.score, 5);
  assert_eq!(patched.insight_summary, "original summary");
  assert_eq!(patched.category, Category::Science);
  assert_eq!(patched.intent, Intent::ResearchLearn);
  assert!(patched.updated_at > 1_000);
}

#[tokio::test]
async fn update_insight_accepts_explicit_timestamp() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();
  let insight = s.add_insight(&persona.id, note("n")).await.unwrap();

  let patched = s
    .update_insight(&insight.id, InsightPatch {
      intent: Some(Intent::CompareEvaluate),
      updated_at: Some(42),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(patched.intent, Intent::CompareEvaluate);
  assert_eq!(patched.updated_at, 42);
}

#[tokio::test]
async fn update_missing_insight_errors_and_changes_nothing() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();
  let insight = s.add_insight(&persona.id, note("untouched")).await.unwrap();

  let err = s
    .update_insight("ghost", InsightPatch {
      insight_summary: Some("rewritten".to_owned()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::InsightNotFound(_)));

  let listed = s.list_insights(&persona.id).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].insight_summary, insight.insight_summary);
  assert_eq!(listed[0].updated_at, insight.updated_at);
}

#[tokio::test]
async fn delete_insight_is_idempotent() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();
  let insight = s.add_insight(&persona.id, note("gone soon")).await.unwrap();

  s.delete_insight(&insight.id).await.unwrap();
  assert!(s.list_insights(&persona.id).await.unwrap().is_empty());

  s.delete_insight(&insight.id).await.unwrap();
}

#[tokio::test]
async fn list_insights_most_recent_first() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();

  for (summary, at) in [("old", 1_000), ("new", 3_000), ("mid", 2_000)] {
    let mut input = note(summary);
    input.updated_at = Some(at);
    s.add_insight(&persona.id, input).await.unwrap();
  }

  let summaries: Vec<_> = s
    .list_insights(&persona.id)
    .await
    .unwrap()
    .into_iter()
    .map(|i| i.insight_summary)
    .collect();
  assert_eq!(summaries, ["new", "mid", "old"]);
}

#[tokio::test]
async fn soft_deleted_insights_drop_out_of_listings() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();

  let keep = s.add_insight(&persona.id, note("keep")).await.unwrap();
  let hide = s.add_insight(&persona.id, note("hide")).await.unwrap();

  s.update_insight(&hide.id, InsightPatch {
    is_deleted: Some(true),
    ..Default::default()
  })
  .await
  .unwrap();

  let listed = s.list_insights(&persona.id).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].id, keep.id);

  // The row itself stays until hard-deleted.
  assert_eq!(rows_for(&s, "insights", "persona_id", &persona.id).await, 2);
}

// ─── Import ──────────────────────────────────────────────────────────────────

fn import_entry(url: &str, title: &str, at: &str, html: Option<&str>) -> HistoryImport {
  HistoryImport {
    url:         url.to_owned(),
    title:       title.to_owned(),
    description: String::new(),
    visited_at:  ts(at),
    html:        html.map(str::to_owned),
  }
}

#[tokio::test]
async fn import_materialises_full_dataset() {
  let s = store().await;

  let persona = s
    .import_persona(
      "Imported",
      vec![
        import_entry("https://example.com/a", "A", "2024-01-01T00:00:00.000Z", Some("<p>a</p>")),
        import_entry("https://example.com/b", "B", "2024-01-02T00:00:00.000Z", None),
      ],
      vec![note("carried over")],
    )
    .await
    .unwrap();

  assert_eq!(persona.name, "Imported");

  let history = s.list_history(&persona.id).await.unwrap();
  assert_eq!(history.len(), 2);

  let with_snapshot = history.iter().find(|e| e.url.ends_with("/a")).unwrap();
  let without = history.iter().find(|e| e.url.ends_with("/b")).unwrap();
  assert!(s.get_snapshot(&with_snapshot.id).await.unwrap().is_some());
  assert!(s.get_snapshot(&without.id).await.unwrap().is_none());

  assert_eq!(s.list_insights(&persona.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn import_collapses_duplicate_urls() {
  let s = store().await;

  let persona = s
    .import_persona(
      "Dupes",
      vec![
        import_entry("https://example.com/x", "First", "2024-01-01T00:00:00.000Z", None),
        import_entry("https://example.com/x", "Last", "2024-01-02T00:00:00.000Z", None),
      ],
      vec![],
    )
    .await
    .unwrap();

  let history = s.list_history(&persona.id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].title, "Last");
}

#[tokio::test]
async fn failed_import_leaves_no_partial_persona() {
  let s = store().await;
  let personas_before = total_rows(&s, "personas").await;

  // Two insights with the same id violate the primary key mid-import;
  // the whole batch must roll back.
  let mut a = note("first");
  a.id = Some("dup".to_owned());
  let mut b = note("second");
  b.id = Some("dup".to_owned());

  let result = s
    .import_persona(
      "Broken",
      vec![import_entry("https://example.com/", "Home", "2024-01-01T00:00:00.000Z", Some("<p>x</p>"))],
      vec![a, b],
    )
    .await;
  assert!(result.is_err());

  assert_eq!(total_rows(&s, "personas").await, personas_before);
  assert_eq!(total_rows(&s, "history").await, 0);
  assert_eq!(total_rows(&s, "page_snapshots").await, 0);
  assert_eq!(total_rows(&s, "insights").await, 0);
}

// ─── Active persona pointer ──────────────────────────────────────────────────

#[tokio::test]
async fn pointer_starts_absent() {
  let s = store().await;
  let active = ActivePersona::load(&s).await;
  assert!(active.get().await.is_none());
}

#[tokio::test]
async fn pointer_set_then_get_roundtrips() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();
  let active = ActivePersona::load(&s).await;

  active.set(&persona.id).await;
  assert_eq!(active.get().await.as_deref(), Some(persona.id.as_str()));

  // A fresh handle over the same store sees the persisted value.
  let reloaded = ActivePersona::load(&s).await;
  assert_eq!(reloaded.get().await.as_deref(), Some(persona.id.as_str()));
}

#[tokio::test]
async fn pointer_changes_reach_subscribers() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();
  let active = ActivePersona::load(&s).await;

  let mut rx = active.subscribe();
  active.clone().set(&persona.id).await;

  rx.changed().await.unwrap();
  assert_eq!(rx.borrow().as_deref(), Some(persona.id.as_str()));
}

#[tokio::test]
async fn pointer_tolerates_dangling_id() {
  let s = store().await;
  let persona = s.create_persona("p").await.unwrap();
  let active = ActivePersona::load(&s).await;

  active.set(&persona.id).await;
  s.delete_persona(&persona.id).await.unwrap();

  // The pointer still holds the stale id; resolution treats it as
  // "no active persona".
  let stale = active.get().await.unwrap();
  assert!(s.get_persona(&stale).await.unwrap().is_none());
}
