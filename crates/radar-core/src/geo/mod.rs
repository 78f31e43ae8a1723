//! Device geolocation seam.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and within ±90 latitude / ±180 longitude.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// How precise a fix the caller wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccuracyHint {
    Low,
    Balanced,
    #[default]
    High,
}

#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("Location permission was not granted")]
    PermissionDenied,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Source of the device's current position.
pub trait GeolocationProvider: Send + Sync + 'static {
    /// Ask for location permission; `true` when granted.
    fn request_permission(&self) -> impl Future<Output = bool> + Send;

    /// Current device coordinate.
    fn current_coordinate(
        &self,
        accuracy: AccuracyHint,
    ) -> impl Future<Output = Result<Coordinate, GeolocationError>> + Send;
}

/// Provider backed by a fixed, pre-configured position.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedGeolocation {
    permission_granted: bool,
    coordinate: Option<Coordinate>,
}

impl FixedGeolocation {
    /// Permission granted, always reporting `coordinate`.
    #[must_use]
    pub const fn granted(coordinate: Coordinate) -> Self {
        Self {
            permission_granted: true,
            coordinate: Some(coordinate),
        }
    }

    /// Permission granted but no fix available.
    #[must_use]
    pub const fn without_fix() -> Self {
        Self {
            permission_granted: true,
            coordinate: None,
        }
    }

    #[must_use]
    pub const fn denied() -> Self {
        Self {
            permission_granted: false,
            coordinate: None,
        }
    }
}

impl GeolocationProvider for FixedGeolocation {
    async fn request_permission(&self) -> bool {
        self.permission_granted
    }

    async fn current_coordinate(
        &self,
        _accuracy: AccuracyHint,
    ) -> Result<Coordinate, GeolocationError> {
        if !self.permission_granted {
            return Err(GeolocationError::PermissionDenied);
        }
        let coordinate = self
            .coordinate
            .ok_or_else(|| GeolocationError::Unavailable("no position configured".to_string()))?;
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(GeolocationError::InvalidCoordinate {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            })
        }
    }
}
