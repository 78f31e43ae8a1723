//! Hotspot model

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::Coordinate;

/// Label shown for hotspots nobody has named.
pub const DEFAULT_LABEL: &str = "Hot Spot";

/// Longest label accepted, in characters.
pub const MAX_LABEL_CHARS: usize = 40;

/// Store-assigned hotspot identifier (the table's identity column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HotspotId(i64);

impl HotspotId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for HotspotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HotspotId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A short-lived, user-reported location marker
///
/// Only `label` ever changes after creation. `timestamp` is kept as the raw
/// ISO-8601 text the store returned so unparsable rows can still be held (and
/// swept) instead of failing the whole query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Store-assigned id, absent until the insert is acknowledged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<HotspotId>,
    pub latitude: f64,
    pub longitude: f64,
    /// Creation instant (ISO-8601)
    #[serde(default, deserialize_with = "nullable_string")]
    pub timestamp: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl Hotspot {
    /// Parsed creation instant, `None` when missing or malformed.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// Whether the hotspot has outlived `ttl` at `now`.
    ///
    /// Rows without a usable timestamp count as expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        self.created_at()
            .is_none_or(|created_at| now.signed_duration_since(created_at) >= ttl)
    }

    /// Label to render: trimmed, capped like `normalize_label`, or the default.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map_or(DEFAULT_LABEL, cap_label)
    }

    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Candidate row sent to the store's insert operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewHotspot {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl NewHotspot {
    /// Unlabelled candidate at `coordinate`, stamped with `now`.
    #[must_use]
    pub fn at(coordinate: Coordinate, now: DateTime<Utc>) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            timestamp: format_timestamp(now),
            label: None,
        }
    }

    /// The row as the store will hold it once `id` is assigned.
    #[must_use]
    pub fn into_hotspot(self, id: HotspotId) -> Hotspot {
        Hotspot {
            id: Some(id),
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp: self.timestamp,
            label: self.label,
        }
    }
}

/// The only fields an update-by-id may touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotspotPatch {
    pub label: String,
}

impl HotspotPatch {
    /// Patch setting the normalized form of `raw` as the label.
    #[must_use]
    pub fn label(raw: &str) -> Self {
        Self {
            label: normalize_label(raw),
        }
    }
}

/// Trim a user-entered label, fall back to the default when blank, and cap it
/// at `MAX_LABEL_CHARS` characters.
#[must_use]
pub fn normalize_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_LABEL.to_string();
    }
    cap_label(trimmed).to_string()
}

fn cap_label(label: &str) -> &str {
    let end = label
        .char_indices()
        .nth(MAX_LABEL_CHARS)
        .map_or(label.len(), |(index, _)| index);
    label[..end].trim_end()
}

/// Format an instant the way hotspot rows store it.
#[must_use]
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored hotspot timestamp.
///
/// Accepts RFC 3339 and offset-less ISO-8601 (read as UTC, which is what a
/// `timestamp without time zone` column returns).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
