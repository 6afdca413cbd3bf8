//! Building and parsing the zip container.

use std::io::{Cursor, Read, Seek, Write as _};

use zip::{
  result::ZipError, write::SimpleFileOptions, CompressionMethod, ZipArchive,
  ZipWriter,
};

use spoor_core::{history::HistoryEntry, insight::Insight, persona::Persona};

use crate::{
  manifest::{Manifest, ManifestHistory, ManifestInsight, ManifestPersona},
  path::snapshot_path,
  Error, Result,
};

// ─── Export ──────────────────────────────────────────────────────────────────

/// One history entry paired with its snapshot body, if one was captured.
#[derive(Debug, Clone)]
pub struct ExportEntry {
  pub entry: HistoryEntry,
  pub html:  Option<String>,
}

/// Serialise the manifest document alone — the exact bytes that land in the
/// container as `persona.json`.
pub fn build_manifest_json(
  persona: &Persona,
  entries: &[ExportEntry],
  insights: &[Insight],
) -> Result<String> {
  let history: Vec<HistoryEntry> =
    entries.iter().map(|e| e.entry.clone()).collect();
  let manifest = Manifest::for_export(persona, &history, insights);
  Ok(serde_json::to_string_pretty(&manifest)?)
}

/// Build the complete archive container.
///
/// `persona.json` is written first, then one entry per history item with a
/// non-empty HTML body, at its derived path, in history order. Entries are
/// stored uncompressed.
pub fn build_archive(
  persona: &Persona,
  entries: &[ExportEntry],
  insights: &[Insight],
) -> Result<Vec<u8>> {
  let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
  let options =
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

  let manifest_json = build_manifest_json(persona, entries, insights)?;
  zip.start_file("persona.json", options)?;
  zip.write_all(manifest_json.as_bytes())?;

  for export in entries {
    let Some(html) = export.html.as_deref().filter(|h| !h.is_empty()) else {
      continue;
    };
    zip.start_file(snapshot_path(&export.entry.url), options)?;
    zip.write_all(html.as_bytes())?;
  }

  Ok(zip.finish()?.into_inner())
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// One parsed history item with its recovered snapshot body, if the
/// container held one.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
  pub item:          ManifestHistory,
  pub snapshot_html: Option<String>,
}

/// The in-memory result of [`parse_archive`]. Materialising these records
/// into a store (under a freshly minted persona id) is the caller's job.
#[derive(Debug, Clone)]
pub struct ParsedArchive {
  pub persona:  Option<ManifestPersona>,
  pub history:  Vec<ParsedEntry>,
  pub insights: Vec<ManifestInsight>,
}

/// Parse an uploaded container.
///
/// A container without a parseable `persona.json` aborts entirely; absent
/// snapshot bodies are normal and leave `snapshot_html` unset.
pub fn parse_archive(bytes: &[u8]) -> Result<ParsedArchive> {
  let mut archive = ZipArchive::new(Cursor::new(bytes))?;

  let manifest_text = read_entry(&mut archive, "persona.json")?
    .ok_or(Error::MissingManifest)?;
  let manifest: Manifest =
    serde_json::from_str(&manifest_text).map_err(Error::InvalidManifest)?;

  let mut history = Vec::with_capacity(manifest.history.len());
  for item in manifest.history {
    let snapshot_html = match item.snapshot_path.as_deref() {
      Some(path) => {
        read_entry(&mut archive, path.strip_prefix("./").unwrap_or(path))?
      }
      None => None,
    };
    history.push(ParsedEntry { item, snapshot_html });
  }

  Ok(ParsedArchive {
    persona: manifest.persona,
    history,
    insights: manifest.insights,
  })
}

/// Read a container entry as UTF-8 text; a missing entry is `None`.
fn read_entry<R: Read + Seek>(
  archive: &mut ZipArchive<R>,
  name: &str,
) -> Result<Option<String>> {
  let mut file = match archive.by_name(name) {
    Ok(file) => file,
    Err(ZipError::FileNotFound) => return Ok(None),
    Err(e) => return Err(e.into()),
  };
  let mut text = String::new();
  file.read_to_string(&mut text)?;
  Ok(Some(text))
}
