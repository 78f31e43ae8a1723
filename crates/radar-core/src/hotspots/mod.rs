//! Ephemeral hotspot layer: local set, merge rules, and the lifecycle manager.

mod error;
mod manager;
mod set;

use std::time::Duration;

use crate::config::RadarConfig;
use crate::geo::AccuracyHint;

pub use error::HotspotError;
pub use manager::{ActivationReport, HotspotManager};
pub use set::{HotspotEvent, HotspotKey, HotspotSet};

/// Timing rules for one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotspotSettings {
    /// How long a hotspot stays visible after its timestamp
    pub ttl: chrono::Duration,
    /// How often expired hotspots are swept
    pub sweep_interval: Duration,
    pub accuracy: AccuracyHint,
}

impl Default for HotspotSettings {
    fn default() -> Self {
        let config = RadarConfig::default();
        Self {
            ttl: config.ttl(),
            sweep_interval: config.sweep_interval(),
            accuracy: AccuracyHint::High,
        }
    }
}
