use std::path::Path;

use chrono::{DateTime, Utc};
use radar_core::catalog::load_event_catalog;
use radar_core::config::RadarConfig;
use radar_core::geo::Coordinate;
use radar_core::models::EventCatalog;
use radar_core::store::SupabaseHotspotStore;
use radar_core::util::format_relative_time;
use radar_core::{Hotspot, HotspotId, HotspotSet};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct HotspotListItem {
    pub id: Option<i64>,
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: String,
    pub relative_time: String,
    pub owned: bool,
}

pub fn open_store(config: &RadarConfig) -> Result<SupabaseHotspotStore, CliError> {
    if !config.has_store() {
        return Err(CliError::StoreNotConfigured);
    }
    Ok(SupabaseHotspotStore::from_config(config)?)
}

/// Explicit `--lat/--lon`, else the configured default position.
pub fn resolve_coordinate(
    latitude: Option<f64>,
    longitude: Option<f64>,
    config: &RadarConfig,
) -> Result<Coordinate, CliError> {
    let coordinate = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude),
        _ => config.default_coordinate().ok_or(CliError::NoLocation)?,
    };
    if !coordinate.is_valid() {
        return Err(CliError::Config(format!(
            "coordinate ({}, {}) is out of range",
            coordinate.latitude, coordinate.longitude
        )));
    }
    Ok(coordinate)
}

/// Rows still inside the TTL window, oldest first.
pub fn live_hotspots(
    rows: Vec<Hotspot>,
    now: DateTime<Utc>,
    ttl: chrono::Duration,
) -> Vec<Hotspot> {
    let mut hotspots = HotspotSet::from_rows(rows);
    hotspots.sweep(now, ttl);
    hotspots.snapshot()
}

pub fn hotspot_to_list_item(
    hotspot: &Hotspot,
    now: DateTime<Utc>,
    owned_id: Option<HotspotId>,
) -> HotspotListItem {
    HotspotListItem {
        id: hotspot.id.map(HotspotId::get),
        label: hotspot.display_label().to_string(),
        latitude: hotspot.latitude,
        longitude: hotspot.longitude,
        timestamp: hotspot.timestamp.clone(),
        relative_time: hotspot.created_at().map_or_else(
            || "unknown".to_string(),
            |created_at| format_relative_time(created_at, now),
        ),
        owned: owned_id.is_some() && hotspot.id == owned_id,
    }
}

pub fn format_hotspot_line(
    hotspot: &Hotspot,
    now: DateTime<Utc>,
    owned_id: Option<HotspotId>,
) -> String {
    let item = hotspot_to_list_item(hotspot, now, owned_id);
    let id = item.id.map_or_else(|| "-".to_string(), |id| id.to_string());
    let marker = if item.owned { " (yours)" } else { "" };
    format!(
        "{id:>6}  {:<40}  {:>9.5}, {:>10.5}  {}{marker}",
        item.label, item.latitude, item.longitude, item.relative_time
    )
}

pub fn format_hotspot_lines(
    hotspots: &[Hotspot],
    now: DateTime<Utc>,
    owned_id: Option<HotspotId>,
) -> Vec<String> {
    if hotspots.is_empty() {
        return vec!["No live hotspots.".to_string()];
    }
    hotspots
        .iter()
        .map(|hotspot| format_hotspot_line(hotspot, now, owned_id))
        .collect()
}

pub fn load_catalog(path: &Path) -> Result<EventCatalog, CliError> {
    if !path.exists() {
        return Err(CliError::Config(format!(
            "Event catalog not found at {}",
            path.display()
        )));
    }
    Ok(load_event_catalog(path)?)
}

pub fn format_event_lines(catalog: &EventCatalog) -> Vec<String> {
    if catalog.is_empty() {
        return vec!["No events.".to_string()];
    }

    let mut lines = Vec::new();
    for event in &catalog.events {
        lines.push(event.event_name.clone());
        let details = event.details_line();
        if !details.is_empty() {
            lines.push(format!("  {details}"));
        }
        if !event.cool_factor.is_empty() {
            lines.push(format!("  {}", event.cool_factor));
        }
    }
    lines
}
