//! Loading the pre-fetched campus event catalog (`clean_events.json`).

use std::path::Path;

use crate::error::{Error, Result};
use crate::models::EventCatalog;

/// Default file name written by the event scraper.
pub const DEFAULT_CATALOG_FILE: &str = "clean_events.json";

/// Parse a catalog payload.
///
/// Fields are trimmed; an entry without an event name is rejected.
pub fn parse_event_catalog(payload: &str) -> Result<EventCatalog> {
    let mut catalog: EventCatalog = serde_json::from_str(payload)?;
    for (index, event) in catalog.events.iter_mut().enumerate() {
        event.event_name = event.event_name.trim().to_string();
        if event.event_name.is_empty() {
            return Err(Error::InvalidInput(format!(
                "event #{} has an empty eventName",
                index + 1
            )));
        }
        event.cool_factor = event.cool_factor.trim().to_string();
        event.description = event.description.trim().to_string();
        event.location_name = event.location_name.trim().to_string();
        event.time = event.time.trim().to_string();
    }
    Ok(catalog)
}

/// Read and parse the catalog at `path`.
pub fn load_event_catalog(path: &Path) -> Result<EventCatalog> {
    let raw = std::fs::read_to_string(path)?;
    let catalog = parse_event_catalog(&raw)?;
    tracing::debug!(
        "Loaded {} campus events from {}",
        catalog.len(),
        path.display()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
    {
      "events": [
        {
          "eventName": " CS Resume Workshop ",
          "coolFactor": "Land Your Dream Internship",
          "description": "Bring your resume and get live feedback.",
          "locationName": "TBE",
          "time": "Feb 20 at 4:00 PM",
          "organizer": "ignored"
        },
        {
          "eventName": "Free Nashville Hot Chicken",
          "locationName": "Student Union"
        }
      ]
    }
    "#;

    #[test]
    fn parse_catalog_trims_and_defaults() {
        let catalog = parse_event_catalog(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.events[0].event_name, "CS Resume Workshop");
        assert_eq!(catalog.events[1].cool_factor, "");
        assert_eq!(catalog.events[1].location_name, "Student Union");
    }

    #[test]
    fn parse_catalog_rejects_blank_names() {
        let error = parse_event_catalog(r#"{"events": [{"eventName": "  "}]}"#).unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[test]
    fn parse_catalog_accepts_missing_events_key() {
        let catalog = parse_event_catalog("{}").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn load_catalog_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CATALOG_FILE);
        std::fs::write(&path, SAMPLE).unwrap();

        let catalog = load_event_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 2);

        let missing = load_event_catalog(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, Error::Io(_)));
    }
}
