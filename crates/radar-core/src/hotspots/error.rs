use thiserror::Error;

use crate::geo::GeolocationError;
use crate::store::StoreError;

/// Outcome of a failed hotspot operation. Nothing is retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HotspotError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),
    #[error("Hotspot store unavailable: {0}")]
    StoreUnavailable(String),
    /// Rename attempted without owning the target; the UI should never offer it.
    #[error("No owned hotspot to rename")]
    NoOwnedHotspot,
}

impl HotspotError {
    /// Text to show the user, `None` for internal invariant failures.
    pub const fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied => {
                Some("Location access is off. Allow location to report a hotspot.")
            }
            Self::LocationUnavailable(_) => {
                Some("Couldn't find your location right now. Try again in a moment.")
            }
            Self::StoreUnavailable(_) => {
                Some("Couldn't reach the hotspot service. Check your connection and try again.")
            }
            Self::NoOwnedHotspot => None,
        }
    }
}

impl From<StoreError> for HotspotError {
    fn from(error: StoreError) -> Self {
        Self::StoreUnavailable(error.to_string())
    }
}

impl From<GeolocationError> for HotspotError {
    fn from(error: GeolocationError) -> Self {
        match error {
            GeolocationError::PermissionDenied => Self::PermissionDenied,
            other => Self::LocationUnavailable(other.to_string()),
        }
    }
}
