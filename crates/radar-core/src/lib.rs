//! radar-core - Core library for Campus Radar
//!
//! This crate contains the hotspot models, the hotspot lifecycle manager, and
//! the store/geolocation adapters shared by every Campus Radar interface.

pub mod catalog;
pub mod config;
pub mod error;
pub mod geo;
pub mod hotspots;
pub mod models;
pub mod state;
pub mod store;
pub mod util;

pub use error::{Error, Result};
pub use hotspots::{HotspotError, HotspotManager, HotspotSet, HotspotSettings};
pub use models::{Hotspot, HotspotId};
