//! spoor command-line client.
//!
//! Reads `spoor.toml` (or the path specified with `--config`), opens the
//! SQLite store, and exposes the persona/history/snapshot/insight surface
//! plus archive export/import as subcommands. The `log` and `snapshot`
//! commands stand in for the browser capture collaborator: they feed the
//! store the same `{url, title, visited_at}` metadata and opaque HTML
//! bodies it would receive from a live capture.

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
  str::FromStr as _,
};

use anyhow::{bail, Context as _};
use chrono::Utc;
use clap::{Parser, Subcommand};
use strum::VariantNames as _;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use spoor_archive::{build_archive, parse_archive, ExportEntry};
use spoor_core::{
  history::{HistoryEntry, HistoryImport, NewHistory, PageSnapshot},
  insight::{Category, Insight, InsightPatch, Intent, NewInsight},
  persona::Persona,
  store::PersonaStore,
  time::encode_ts,
};
use spoor_store_sqlite::{ActivePersona, SqliteStore};

// ─── CLI definition ──────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Spoor persona store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "spoor.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Manage personas.
  #[command(subcommand)]
  Persona(PersonaCommand),

  /// Record a visit for the active persona.
  Log {
    url: String,
    /// Page title; defaults to the URL.
    #[arg(long)]
    title: Option<String>,
    #[arg(long, default_value = "")]
    description: String,
  },

  /// Inspect or prune a persona's browsing trail.
  #[command(subcommand)]
  History(HistoryCommand),

  /// Store or show captured page bodies.
  #[command(subcommand)]
  Snapshot(SnapshotCommand),

  /// Manage insight notes.
  #[command(subcommand)]
  Insight(InsightCommand),

  /// Export a persona's dataset to a zip archive.
  Export {
    output: PathBuf,
    /// Persona id; defaults to the active persona.
    #[arg(long)]
    persona: Option<String>,
  },

  /// Import a persona archive as a new persona and activate it.
  Import { input: PathBuf },
}

#[derive(Subcommand)]
enum PersonaCommand {
  /// Create a persona.
  Create { name: String },
  /// List all personas, oldest first.
  List,
  /// Rename a persona.
  Rename { id: String, name: String },
  /// Delete a persona and everything it owns.
  Delete { id: String },
  /// Set the active persona.
  Use { id: String },
  /// Show the active persona.
  Current,
}

#[derive(Subcommand)]
enum HistoryCommand {
  /// List entries, most recent first.
  List {
    #[arg(long)]
    persona: Option<String>,
  },
  /// Delete one entry (and its snapshot).
  Delete { id: String },
  /// Count entries for a persona.
  Count {
    #[arg(long)]
    persona: Option<String>,
  },
}

#[derive(Subcommand)]
enum SnapshotCommand {
  /// Attach an HTML file as the snapshot for a history entry.
  Put { history_id: String, file: PathBuf },
  /// Print the stored snapshot body.
  Show { history_id: String },
}

#[derive(Subcommand)]
enum InsightCommand {
  /// Add an insight to a persona.
  Add {
    summary: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    intent: String,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    score: u8,
    #[arg(long)]
    persona: Option<String>,
  },
  /// Update fields of an existing insight.
  Update {
    id: String,
    #[arg(long)]
    summary: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    intent: Option<String>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    score: Option<u8>,
    /// Soft-delete (true) or restore (false).
    #[arg(long)]
    deleted: Option<bool>,
  },
  /// Hard-delete an insight.
  Delete { id: String },
  /// List live insights, most recently updated first.
  List {
    #[arg(long)]
    persona: Option<String>,
  },
}

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(serde::Deserialize, Clone)]
struct CliConfig {
  store_path: PathBuf,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .set_default("store_path", "spoor.db")
    .context("invalid default configuration")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SPOOR"))
    .build()
    .context("failed to read config file")?;

  let cfg: CliConfig = settings
    .try_deserialize()
    .context("failed to deserialise configuration")?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::debug!(?store_path, "store opened");
  let active = ActivePersona::load(&store).await;

  match cli.command {
    Command::Persona(cmd) => run_persona(&store, &active, cmd).await,
    Command::Log { url, title, description } => {
      run_log(&store, &active, url, title, description).await
    }
    Command::History(cmd) => run_history(&store, &active, cmd).await,
    Command::Snapshot(cmd) => run_snapshot(&store, cmd).await,
    Command::Insight(cmd) => run_insight(&store, &active, cmd).await,
    Command::Export { output, persona } => {
      run_export(&store, &active, output, persona).await
    }
    Command::Import { input } => run_import(&store, &active, input).await,
  }
}

// ─── Persona commands ────────────────────────────────────────────────────────

async fn run_persona(
  store: &SqliteStore,
  active: &ActivePersona,
  cmd: PersonaCommand,
) -> anyhow::Result<()> {
  match cmd {
    PersonaCommand::Create { name } => {
      let persona = store.create_persona(&name).await?;
      println!("{}  {}", persona.id, persona.name);
    }
    PersonaCommand::List => {
      let current = active.get().await;
      for persona in store.list_personas().await? {
        let marker = if current.as_deref() == Some(persona.id.as_str()) {
          "*"
        } else {
          " "
        };
        println!(
          "{marker} {}  {}  {}",
          persona.id,
          encode_ts(persona.created_at),
          persona.name
        );
      }
    }
    PersonaCommand::Rename { id, name } => {
      store.rename_persona(&id, &name).await?;
      println!("renamed {id}");
    }
    PersonaCommand::Delete { id } => {
      store.delete_persona(&id).await?;
      println!("deleted {id}");
    }
    PersonaCommand::Use { id } => {
      let persona = store
        .get_persona(&id)
        .await?
        .with_context(|| format!("persona {id} not found"))?;
      active.set(&persona.id).await;
      println!("now capturing as {}", persona.name);
    }
    PersonaCommand::Current => match resolve_active(store, active).await? {
      Some(persona) => println!("{}  {}", persona.id, persona.name),
      None => println!("no active persona"),
    },
  }
  Ok(())
}

// ─── Capture commands ────────────────────────────────────────────────────────

async fn run_log(
  store: &SqliteStore,
  active: &ActivePersona,
  url: String,
  title: Option<String>,
  description: String,
) -> anyhow::Result<()> {
  let persona = require_persona(store, active, None).await?;

  let entry = store
    .upsert_history(NewHistory {
      persona_id:  persona.id.clone(),
      title:       title.unwrap_or_else(|| url.clone()),
      url,
      description,
      visited_at:  Utc::now(),
      id:          None,
    })
    .await?;

  // The count doubles as the badge number in the capture surface.
  let count = store.count_history(&persona.id).await?;
  println!("{}  ({count} entries for {})", entry.id, persona.name);
  Ok(())
}

async fn run_history(
  store: &SqliteStore,
  active: &ActivePersona,
  cmd: HistoryCommand,
) -> anyhow::Result<()> {
  match cmd {
    HistoryCommand::List { persona } => {
      let persona = require_persona(store, active, persona).await?;
      for entry in store.list_history(&persona.id).await? {
        println!(
          "{}  {}  {}  {}",
          entry.id,
          encode_ts(entry.visited_at),
          entry.url,
          entry.title
        );
      }
    }
    HistoryCommand::Delete { id } => {
      store.delete_history(&id).await?;
      println!("deleted {id}");
    }
    HistoryCommand::Count { persona } => {
      let persona = require_persona(store, active, persona).await?;
      println!("{}", store.count_history(&persona.id).await?);
    }
  }
  Ok(())
}

async fn run_snapshot(
  store: &SqliteStore,
  cmd: SnapshotCommand,
) -> anyhow::Result<()> {
  match cmd {
    SnapshotCommand::Put { history_id, file } => {
      let entry = find_history(store, &history_id).await?;
      let html = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {file:?}"))?;

      store
        .put_snapshot(PageSnapshot {
          history_id:  entry.id.clone(),
          persona_id:  entry.persona_id,
          url:         entry.url,
          captured_at: Utc::now(),
          html,
        })
        .await?;
      println!("captured {}", entry.id);
    }
    SnapshotCommand::Show { history_id } => {
      match store.get_snapshot(&history_id).await? {
        Some(snapshot) => print!("{}", snapshot.html),
        None => println!("no snapshot for {history_id}"),
      }
    }
  }
  Ok(())
}

// ─── Insight commands ────────────────────────────────────────────────────────

async fn run_insight(
  store: &SqliteStore,
  active: &ActivePersona,
  cmd: InsightCommand,
) -> anyhow::Result<()> {
  match cmd {
    InsightCommand::Add { summary, category, intent, score, persona } => {
      let persona = require_persona(store, active, persona).await?;
      let insight = store
        .add_insight(
          &persona.id,
          NewInsight::new(
            summary,
            parse_category(&category)?,
            parse_intent(&intent)?,
            score,
          ),
        )
        .await?;
      println!("{}", insight.id);
    }
    InsightCommand::Update { id, summary, category, intent, score, deleted } => {
      let patch = InsightPatch {
        insight_summary: summary,
        category:        category.as_deref().map(parse_category).transpose()?,
        intent:          intent.as_deref().map(parse_intent).transpose()?,
        score,
        updated_at:      None,
        is_deleted:      deleted,
      };
      let insight = store.update_insight(&id, patch).await?;
      print_insight(&insight);
    }
    InsightCommand::Delete { id } => {
      store.delete_insight(&id).await?;
      println!("deleted {id}");
    }
    InsightCommand::List { persona } => {
      let persona = require_persona(store, active, persona).await?;
      for insight in store.list_insights(&persona.id).await? {
        print_insight(&insight);
      }
    }
  }
  Ok(())
}

fn print_insight(insight: &Insight) {
  println!(
    "{}  [{}/{}] score {}  {}",
    insight.id,
    insight.category,
    insight.intent,
    insight.score,
    insight.insight_summary
  );
}

fn parse_category(s: &str) -> anyhow::Result<Category> {
  Category::from_str(s).map_err(|_| {
    anyhow::anyhow!(
      "unknown category {s:?}; expected one of: {}",
      Category::VARIANTS.join(", ")
    )
  })
}

fn parse_intent(s: &str) -> anyhow::Result<Intent> {
  Intent::from_str(s).map_err(|_| {
    anyhow::anyhow!(
      "unknown intent {s:?}; expected one of: {}",
      Intent::VARIANTS.join(", ")
    )
  })
}

// ─── Archive commands ────────────────────────────────────────────────────────

async fn run_export(
  store: &SqliteStore,
  active: &ActivePersona,
  output: PathBuf,
  persona: Option<String>,
) -> anyhow::Result<()> {
  let persona = require_persona(store, active, persona).await?;

  let history = store.list_history(&persona.id).await?;
  let mut entries = Vec::with_capacity(history.len());
  for entry in history {
    let html = store.get_snapshot(&entry.id).await?.map(|s| s.html);
    entries.push(ExportEntry { entry, html });
  }
  let insights = store.list_insights(&persona.id).await?;

  let bytes = build_archive(&persona, &entries, &insights)?;
  std::fs::write(&output, bytes)
    .with_context(|| format!("failed to write {output:?}"))?;

  println!(
    "exported {} ({} entries) to {}",
    persona.name,
    entries.len(),
    output.display()
  );
  Ok(())
}

async fn run_import(
  store: &SqliteStore,
  active: &ActivePersona,
  input: PathBuf,
) -> anyhow::Result<()> {
  let bytes = std::fs::read(&input)
    .with_context(|| format!("failed to read {input:?}"))?;
  let parsed = parse_archive(&bytes)?;

  let desired = parsed
    .persona
    .map(|p| p.name)
    .filter(|n| !n.is_empty())
    .unwrap_or_else(|| "Imported Persona".to_owned());
  let existing = store.list_personas().await?;
  let name = ensure_unique_name(&desired, &existing);

  let entries: Vec<HistoryImport> = parsed
    .history
    .into_iter()
    .map(|item| HistoryImport {
      title:       if item.item.title.is_empty() {
        item.item.url.clone()
      } else {
        item.item.title
      },
      url:         item.item.url,
      description: item.item.description,
      visited_at:  item.item.visited_at.unwrap_or_else(Utc::now),
      html:        item.snapshot_html,
    })
    .collect();

  let insights: Vec<NewInsight> = parsed
    .insights
    .into_iter()
    .map(|insight| NewInsight {
      insight_summary: insight.insight_summary,
      category:        insight.category,
      intent:          insight.intent,
      score:           insight.score,
      updated_at:      Some(insight.updated_at),
      is_deleted:      Some(insight.is_deleted),
      id:              None,
    })
    .collect();

  let persona = store.import_persona(&name, entries, insights).await?;
  active.set(&persona.id).await;

  println!(
    "imported {} ({} entries)",
    persona.name,
    store.count_history(&persona.id).await?
  );
  Ok(())
}

/// `"Name"`, `"Name (2)"`, `"Name (3)"`, … against the existing personas.
fn ensure_unique_name(desired: &str, existing: &[Persona]) -> String {
  let names: HashSet<&str> = existing.iter().map(|p| p.name.as_str()).collect();
  if !names.contains(desired) {
    return desired.to_owned();
  }
  let mut counter = 2;
  loop {
    let candidate = format!("{desired} ({counter})");
    if !names.contains(candidate.as_str()) {
      return candidate;
    }
    counter += 1;
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Resolve the active pointer to a persona, treating a dangling id as "no
/// active persona".
async fn resolve_active(
  store: &SqliteStore,
  active: &ActivePersona,
) -> anyhow::Result<Option<Persona>> {
  let Some(id) = active.get().await else {
    return Ok(None);
  };
  Ok(store.get_persona(&id).await?)
}

/// The persona named by `explicit`, or the active persona.
async fn require_persona(
  store: &SqliteStore,
  active: &ActivePersona,
  explicit: Option<String>,
) -> anyhow::Result<Persona> {
  match explicit {
    Some(id) => store
      .get_persona(&id)
      .await?
      .with_context(|| format!("persona {id} not found")),
    None => resolve_active(store, active)
      .await?
      .context("no active persona; run `spoor persona use <id>`"),
  }
}

/// Look up a history entry by id across all personas.
async fn find_history(
  store: &SqliteStore,
  id: &str,
) -> anyhow::Result<HistoryEntry> {
  for persona in store.list_personas().await? {
    if let Some(entry) = store
      .list_history(&persona.id)
      .await?
      .into_iter()
      .find(|e| e.id == id)
    {
      return Ok(entry);
    }
  }
  bail!("history entry {id} not found")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
