use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use radar_core::geo::FixedGeolocation;
use radar_core::store::SupabaseHotspotStore;
use radar_core::{Hotspot, HotspotError, HotspotManager};

use crate::commands::common::{
    format_hotspot_line, hotspot_to_list_item, open_store, resolve_coordinate,
};
use crate::config::load_config;
use crate::error::CliError;

pub async fn run_report(
    latitude: Option<f64>,
    longitude: Option<f64>,
    label: Option<&str>,
    as_json: bool,
    config_path: &Path,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let coordinate = resolve_coordinate(latitude, longitude, &config)?;

    let manager = HotspotManager::new(
        Arc::new(store),
        Arc::new(FixedGeolocation::granted(coordinate)),
        config.hotspot_settings(),
    );
    manager.initialize().await;
    let result = report_and_label(&manager, label).await;
    manager.deactivate().await;
    let hotspot = result?;

    let now = Utc::now();
    if as_json {
        let item = hotspot_to_list_item(&hotspot, now, hotspot.id);
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!("Reported hotspot:");
        println!("{}", format_hotspot_line(&hotspot, now, hotspot.id));
    }

    Ok(())
}

async fn report_and_label(
    manager: &HotspotManager<SupabaseHotspotStore, FixedGeolocation>,
    label: Option<&str>,
) -> Result<Hotspot, HotspotError> {
    let mut hotspot = manager.report_hotspot().await?;
    if let Some(label) = label {
        let stored = manager.rename_owned_hotspot(label).await?;
        hotspot.label = Some(stored);
    }
    Ok(hotspot)
}
