use std::path::Path;

use radar_core::config::RadarConfig;

use crate::cli::{ConfigCommands, ConfigSetArgs};
use crate::config::{load_config, redacted};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, config_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let config = load_config(config_path)?;
            println!("{}", serde_json::to_string_pretty(&redacted(&config))?);
            if !config_path.exists() {
                eprintln!("(no config file at {}; showing defaults)", config_path.display());
            }
        }
        ConfigCommands::Path => println!("{}", config_path.display()),
        ConfigCommands::Set(args) => {
            let config = run_config_set(args, config_path)?;
            println!("Saved config to {}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&redacted(&config))?);
        }
    }
    Ok(())
}

/// Merge `args` into the file at `config_path` and write it back.
///
/// Environment overrides are not applied, so they never leak into the file.
pub fn run_config_set(
    args: ConfigSetArgs,
    config_path: &Path,
) -> Result<RadarConfig, CliError> {
    let mut config = RadarConfig::load_from_path(config_path)?;

    if args.supabase_url.is_some() {
        config.supabase_url = args.supabase_url;
    }
    if args.supabase_anon_key.is_some() {
        config.supabase_anon_key = args.supabase_anon_key;
    }
    if args.hotspot_table.is_some() {
        config.hotspot_table = args.hotspot_table;
    }
    if args.ttl_minutes.is_some() {
        config.ttl_minutes = args.ttl_minutes;
    }
    if args.default_latitude.is_some() {
        config.default_latitude = args.default_latitude;
        config.default_longitude = args.default_longitude;
    }
    if args.event_catalog.is_some() {
        config.event_catalog_path = args.event_catalog;
    }

    config.validate()?;
    config.save_to_path(config_path)?;
    Ok(RadarConfig::load_from_path(config_path)?)
}
