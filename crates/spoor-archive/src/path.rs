//! Deterministic mapping from visited URLs to archive entry paths.
//!
//! Every snapshot body lands at `snapshot/<host>/<segments>.html`, where the
//! segments are derived from the URL's path, query, and fragment. The
//! mapping is order-stable and filesystem-safe; it does not detect the
//! (practically never occurring) case of two distinct URLs deriving the
//! same path.

use url::Url;

/// Replace every character outside `[a-zA-Z0-9._-]` with `_`.
/// An empty input yields the literal segment `item`.
pub fn sanitize_segment(value: &str) -> String {
  let cleaned: String = value
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
        c
      } else {
        '_'
      }
    })
    .collect();
  if cleaned.is_empty() {
    "item".to_owned()
  } else {
    cleaned
  }
}

/// Derive the archive-relative path for a URL's snapshot body.
pub fn snapshot_path(url: &str) -> String {
  let Ok(parsed) = Url::parse(url) else {
    return format!("snapshot/unknown/{}.html", sanitize_segment(url));
  };

  let host = sanitize_segment(parsed.host_str().unwrap_or("unknown"));

  let mut segments: Vec<String> = parsed
    .path()
    .split('/')
    .filter(|s| !s.is_empty())
    .map(sanitize_segment)
    .collect();
  if segments.is_empty() {
    segments.push("index".to_owned());
  }

  if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
    segments.push(sanitize_segment(&format!("query_{query}")));
  }
  if let Some(fragment) = parsed.fragment().filter(|f| !f.is_empty()) {
    segments.push(sanitize_segment(&format!("hash_{fragment}")));
  }

  let joined = segments.join("_");
  let file = if joined.ends_with(".html") {
    joined
  } else {
    format!("{joined}.html")
  };

  format!("snapshot/{host}/{file}")
}
