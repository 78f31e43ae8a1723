//! Campus event model (pre-fetched catalog entries)

use serde::{Deserialize, Serialize};

/// One entry of the pre-fetched campus event catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampusEvent {
    pub event_name: String,
    /// Short hook about why a student should go
    #[serde(default)]
    pub cool_factor: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location_name: String,
    /// Display time, already formatted (e.g. "Feb 20 at 5:00 PM")
    #[serde(default)]
    pub time: String,
}

impl CampusEvent {
    /// "time • location", skipping whichever part is blank
    #[must_use]
    pub fn details_line(&self) -> String {
        [self.time.trim(), self.location_name.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" \u{2022} ")
    }
}

/// Catalog file layout: `{"events": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCatalog {
    #[serde(default)]
    pub events: Vec<CampusEvent>,
}

impl EventCatalog {
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
