use std::io;

use radar_core::store::StoreError;
use radar_core::HotspotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] radar_core::Error),
    #[error(transparent)]
    Hotspot(#[from] HotspotError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Hotspot store is not configured. Set supabase_url and supabase_anon_key in the config file, or RADAR_SUPABASE_URL and RADAR_SUPABASE_ANON_KEY."
    )]
    StoreNotConfigured,
    #[error("No location available. Pass --lat and --lon, or set default_latitude and default_longitude.")]
    NoLocation,
}

impl CliError {
    /// Message for the terminal; hotspot failures use their human wording.
    pub fn user_text(&self) -> String {
        match self {
            Self::Hotspot(error) => error
                .user_message()
                .map_or_else(|| error.to_string(), ToString::to_string),
            other => other.to_string(),
        }
    }
}
