//! Canonical timestamp encoding.
//!
//! Timestamps are encoded as RFC 3339 UTC with millisecond precision and a
//! `Z` suffix (`2024-01-01T00:00:00.000Z`) everywhere they leave memory:
//! SQLite columns and archive manifests must hold the same bytes, which is
//! why the helpers live here rather than in the store crate.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

pub fn encode_ts(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_ts(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Timestamp(format!("{s:?}: {e}")))
}

/// Current time as epoch milliseconds — the `updated_at` representation.
pub fn now_millis() -> i64 { Utc::now().timestamp_millis() }

/// Serde adapter for `DateTime<Utc>` fields using the canonical encoding.
pub mod serde_ts {
  use chrono::{DateTime, Utc};
  use serde::{Deserialize as _, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    dt: &DateTime<Utc>,
    ser: S,
  ) -> Result<S::Ok, S::Error> {
    ser.serialize_str(&super::encode_ts(*dt))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    de: D,
  ) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(de)?;
    super::decode_ts(&s).map_err(serde::de::Error::custom)
  }
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
pub mod serde_ts_opt {
  use chrono::{DateTime, Utc};
  use serde::{Deserialize as _, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    dt: &Option<DateTime<Utc>>,
    ser: S,
  ) -> Result<S::Ok, S::Error> {
    match dt {
      Some(dt) => ser.serialize_str(&super::encode_ts(*dt)),
      None => ser.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    de: D,
  ) -> Result<Option<DateTime<Utc>>, D::Error> {
    let s = Option::<String>::deserialize(de)?;
    s.as_deref()
      .map(super::decode_ts)
      .transpose()
      .map_err(serde::de::Error::custom)
  }
}
