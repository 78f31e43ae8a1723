//! Runtime configuration for Campus Radar clients.
//!
//! Values come from a JSON file and can be overridden from the environment.
//! Every field is optional; accessors fall back to the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_CATALOG_FILE;
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::hotspots::HotspotSettings;
use crate::util::{is_http_url, normalize_text_option};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_HOTSPOT_TABLE: &str = "hotspots";
pub const DEFAULT_TTL_MINUTES: u64 = 20;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_FEED_POLL_INTERVAL_SECS: u64 = 5;
/// One year.
pub const MAX_TTL_MINUTES: u64 = 525_600;
/// One day.
pub const MAX_INTERVAL_SECS: u64 = 86_400;

pub const ENV_SUPABASE_URL: &str = "RADAR_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "RADAR_SUPABASE_ANON_KEY";
pub const ENV_HOTSPOT_TABLE: &str = "RADAR_HOTSPOT_TABLE";
pub const ENV_EVENT_CATALOG: &str = "RADAR_EVENT_CATALOG";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RadarConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default)]
    pub hotspot_table: Option<String>,
    #[serde(default)]
    pub ttl_minutes: Option<u64>,
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
    #[serde(default)]
    pub feed_poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub event_catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub default_latitude: Option<f64>,
    #[serde(default)]
    pub default_longitude: Option<f64>,
}

impl RadarConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!(
                "Failed to parse config at {}: {}",
                path.display(),
                error
            ))
        })?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut normalized = self.clone();
        normalized.normalize();
        std::fs::write(path, serde_json::to_string_pretty(&normalized)?)?;
        Ok(())
    }

    /// Apply `RADAR_*` process environment overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = normalize_text_option(lookup(ENV_SUPABASE_URL)) {
            self.supabase_url = Some(url);
        }
        if let Some(key) = normalize_text_option(lookup(ENV_SUPABASE_ANON_KEY)) {
            self.supabase_anon_key = Some(key);
        }
        if let Some(table) = normalize_text_option(lookup(ENV_HOTSPOT_TABLE)) {
            self.hotspot_table = Some(table);
        }
        if let Some(path) = normalize_text_option(lookup(ENV_EVENT_CATALOG)) {
            self.event_catalog_path = Some(PathBuf::from(path));
        }
    }

    fn normalize(&mut self) {
        self.supabase_url = normalize_text_option(self.supabase_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
        self.supabase_anon_key = normalize_text_option(self.supabase_anon_key.take());
        self.hotspot_table = normalize_text_option(self.hotspot_table.take());
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value, max) in [
            ("ttl_minutes", self.ttl_minutes, MAX_TTL_MINUTES),
            ("sweep_interval_secs", self.sweep_interval_secs, MAX_INTERVAL_SECS),
            (
                "feed_poll_interval_secs",
                self.feed_poll_interval_secs,
                MAX_INTERVAL_SECS,
            ),
        ] {
            match value {
                Some(0) => {
                    return Err(Error::Config(format!("{field} must be greater than zero")));
                }
                Some(value) if value > max => {
                    return Err(Error::Config(format!("{field} must be at most {max}")));
                }
                _ => {}
            }
        }

        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(_)) if !is_http_url(url) => {
                return Err(Error::Config(
                    "supabase_url must include http:// or https://".to_string(),
                ));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::Config(
                    "supabase_url and supabase_anon_key must be set together".to_string(),
                ));
            }
            _ => {}
        }

        match (self.default_latitude, self.default_longitude) {
            (Some(latitude), Some(longitude)) => {
                if !Coordinate::new(latitude, longitude).is_valid() {
                    return Err(Error::Config(format!(
                        "default coordinate ({latitude}, {longitude}) is out of range"
                    )));
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::Config(
                    "default_latitude and default_longitude must be set together".to_string(),
                ));
            }
            (None, None) => {}
        }

        Ok(())
    }

    pub const fn has_store(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_anon_key.is_some()
    }

    pub fn table_name(&self) -> &str {
        self.hotspot_table.as_deref().unwrap_or(DEFAULT_HOTSPOT_TABLE)
    }

    pub fn ttl(&self) -> chrono::Duration {
        let minutes = self
            .ttl_minutes
            .unwrap_or(DEFAULT_TTL_MINUTES)
            .clamp(1, MAX_TTL_MINUTES);
        i64::try_from(minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .unwrap_or_else(|| chrono::Duration::days(365))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.sweep_interval_secs
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS)
                .clamp(1, MAX_INTERVAL_SECS),
        )
    }

    pub fn feed_poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.feed_poll_interval_secs
                .unwrap_or(DEFAULT_FEED_POLL_INTERVAL_SECS)
                .clamp(1, MAX_INTERVAL_SECS),
        )
    }

    pub fn hotspot_settings(&self) -> HotspotSettings {
        HotspotSettings {
            ttl: self.ttl(),
            sweep_interval: self.sweep_interval(),
            ..HotspotSettings::default()
        }
    }

    pub fn default_coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.default_latitude?, self.default_longitude?))
    }

    pub fn event_catalog_path(&self) -> PathBuf {
        self.event_catalog_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_FILE))
    }
}
