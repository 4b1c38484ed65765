// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Convert to a `geo` point (x = longitude, y = latitude).
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

/// Reverse-geocoded address components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Address {
    /// "City, Region" or whichever part is present.
    pub fn short_label(&self) -> Option<String> {
        match (self.city.as_deref(), self.region.as_deref()) {
            (Some(city), Some(region)) => Some(format!("{}, {}", city, region)),
            (Some(city), None) => Some(city.to_string()),
            (None, Some(region)) => Some(region.to_string()),
            (None, None) => None,
        }
    }
}

/// Which branch of the fallback chain produced a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationSource {
    Cache,
    Device,
    LastKnown,
    Fallback,
}

/// A resolved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResult {
    pub coordinates: Coordinates,
    #[serde(default)]
    pub address: Option<Address>,
    /// When the fix was captured
    pub timestamp: DateTime<Utc>,
    pub source: LocationSource,
}

impl LocationResult {
    /// Whether this result is older than `max_age` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: std::time::Duration) -> bool {
        match chrono::Duration::from_std(max_age) {
            Ok(max_age) => now - self.timestamp > max_age,
            Err(_) => false,
        }
    }
}
