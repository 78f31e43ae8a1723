use std::path::Path;

use crate::commands::common::{format_event_lines, load_catalog};
use crate::config::load_config;
use crate::error::CliError;

pub fn run_events(path: Option<&Path>, as_json: bool, config_path: &Path) -> Result<(), CliError> {
    let catalog_path = match path {
        Some(path) => path.to_path_buf(),
        None => load_config(config_path)?.event_catalog_path(),
    };
    let catalog = load_catalog(&catalog_path)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&catalog.events)?);
    } else {
        for line in format_event_lines(&catalog) {
            println!("{line}");
        }
    }

    Ok(())
}
