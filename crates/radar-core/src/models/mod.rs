//! Data models for Campus Radar

mod event;
mod hotspot;

pub use event::{CampusEvent, EventCatalog};
pub use hotspot::{
    format_timestamp, normalize_label, parse_timestamp, Hotspot, HotspotId, HotspotPatch,
    NewHotspot, DEFAULT_LABEL, MAX_LABEL_CHARS,
};
