//! Config file location and resolution for the CLI.

use std::path::{Path, PathBuf};

use radar_core::config::{RadarConfig, CONFIG_FILE_NAME};

use crate::error::CliError;

pub fn default_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("radar").join(CONFIG_FILE_NAME))
}

/// Explicit `--config` path, or the per-user default.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf, CliError> {
    explicit.or_else(default_config_path).ok_or_else(|| {
        CliError::Config("Failed to resolve config directory; pass --config".to_string())
    })
}

/// Load the file at `path`, apply `RADAR_*` overrides, and validate.
pub fn load_config(path: &Path) -> Result<RadarConfig, CliError> {
    let config = RadarConfig::load_from_path(path)?.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Keep the first and last four characters of a secret.
pub fn redact_secret(secret: &str) -> String {
    let chars = secret.chars().collect::<Vec<_>>();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head = chars[..4].iter().collect::<String>();
    let tail = chars[chars.len() - 4..].iter().collect::<String>();
    format!("{head}...{tail}")
}

/// Copy of `config` safe to print.
pub fn redacted(config: &RadarConfig) -> RadarConfig {
    let mut redacted = config.clone();
    redacted.supabase_anon_key = redacted
        .supabase_anon_key
        .as_deref()
        .map(redact_secret);
    redacted
}
