use std::path::Path;

use chrono::Utc;
use radar_core::store::{HotspotStore, QueryFilter};

use crate::commands::common::{
    format_hotspot_lines, hotspot_to_list_item, live_hotspots, open_store, HotspotListItem,
};
use crate::config::load_config;
use crate::error::CliError;

pub async fn run_list(as_json: bool, config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    let now = Utc::now();
    let ttl = config.ttl();
    let rows = store.query_all(&QueryFilter::within(now, ttl)).await?;
    let hotspots = live_hotspots(rows, now, ttl);

    if as_json {
        let json_items = hotspots
            .iter()
            .map(|hotspot| hotspot_to_list_item(hotspot, now, None))
            .collect::<Vec<HotspotListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_hotspot_lines(&hotspots, now, None) {
            println!("{line}");
        }
    }

    Ok(())
}
