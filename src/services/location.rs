// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location resolution and distance helpers.
//!
//! `get_current_location` walks a fallback chain and always produces a result:
//! 1. in-memory cache, if fresh
//! 2. device fix (permission, then position with a timeout, then best-effort
//!    reverse geocoding)
//! 3. persisted last-known location, if fresh
//! 4. the configured fallback city

use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geo::{Distance, Haversine};

use crate::config::Config;
use crate::db::LocalDb;
use crate::error::{AppError, Result};
use crate::models::{Address, Coordinates, LocationResult, LocationSource};

const METERS_PER_MILE: f64 = 1609.344;

/// Outcome of a location permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Platform location services.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus>;

    async fn current_position(&self) -> Result<Coordinates>;

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Option<Address>>;
}

/// Provider for hosts without location services. Permission is always denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocationProvider;

#[async_trait]
impl LocationProvider for UnavailableLocationProvider {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(PermissionStatus::Denied)
    }

    async fn current_position(&self) -> Result<Coordinates> {
        Err(AppError::Location(
            "Location services are not available".to_string(),
        ))
    }

    async fn reverse_geocode(&self, _coordinates: Coordinates) -> Result<Option<Address>> {
        Ok(None)
    }
}

pub struct LocationService {
    provider: Arc<dyn LocationProvider>,
    db: LocalDb,
    cache: StdMutex<Option<LocationResult>>,
    cache_max_age: Duration,
    last_known_max_age: Duration,
    device_timeout: Duration,
    fallback: Coordinates,
    fallback_address: Address,
}

impl LocationService {
    pub fn new(provider: Arc<dyn LocationProvider>, db: LocalDb, config: &Config) -> Self {
        Self {
            provider,
            db,
            cache: StdMutex::new(None),
            cache_max_age: config.location_cache_max_age,
            last_known_max_age: config.last_known_max_age,
            device_timeout: config.device_location_timeout,
            fallback: config.fallback_location,
            fallback_address: address_from_label(&config.fallback_label),
        }
    }

    /// Resolve the user's location. Never fails.
    pub async fn get_current_location(&self) -> LocationResult {
        let now = Utc::now();

        if let Some(cached) = self.cached(now) {
            tracing::debug!("Using cached location");
            return LocationResult {
                source: LocationSource::Cache,
                ..cached
            };
        }

        match self.device_location().await {
            Ok(result) => {
                self.remember(&result).await;
                return result;
            }
            Err(e) => tracing::info!(error = %e, "Device location unavailable"),
        }

        match self.db.get_last_location().await {
            Ok(Some(last))
                if last.coordinates.is_valid() && !last.is_stale(now, self.last_known_max_age) =>
            {
                tracing::debug!(captured_at = %last.timestamp, "Using last known location");
                return LocationResult {
                    source: LocationSource::LastKnown,
                    ..last
                };
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read last known location"),
        }

        tracing::info!("Falling back to default location");
        self.fallback_result(now)
    }

    /// Forget the in-memory location so the next call asks the device again.
    pub fn invalidate_cache(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn cached(&self, now: DateTime<Utc>) -> Option<LocationResult> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|cached| !cached.is_stale(now, self.cache_max_age))
            .cloned()
    }

    async fn device_location(&self) -> Result<LocationResult> {
        let permission = self.provider.request_permission().await?;
        if permission != PermissionStatus::Granted {
            return Err(AppError::Location(format!(
                "Location permission {:?}",
                permission
            )));
        }

        let coordinates = tokio::time::timeout(self.device_timeout, self.provider.current_position())
            .await
            .map_err(|_| {
                AppError::Location("Timed out waiting for a location fix".to_string())
            })??;
        if !coordinates.is_valid() {
            return Err(AppError::Location(
                "Device reported invalid coordinates".to_string(),
            ));
        }

        let address = match self.provider.reverse_geocode(coordinates).await {
            Ok(address) => address,
            Err(e) => {
                tracing::debug!(error = %e, "Reverse geocoding failed");
                None
            }
        };

        Ok(LocationResult {
            coordinates,
            address,
            timestamp: Utc::now(),
            source: LocationSource::Device,
        })
    }

    async fn remember(&self, result: &LocationResult) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = Some(result.clone());
        if let Err(e) = self.db.set_last_location(result).await {
            tracing::warn!(error = %e, "Failed to persist last known location");
        }
    }

    fn fallback_result(&self, now: DateTime<Utc>) -> LocationResult {
        LocationResult {
            coordinates: self.fallback,
            address: Some(self.fallback_address.clone()),
            timestamp: now,
            source: LocationSource::Fallback,
        }
    }
}

/// "City, Region" -> address components.
fn address_from_label(label: &str) -> Address {
    let mut parts = label.splitn(2, ',').map(str::trim).filter(|p| !p.is_empty());
    Address {
        city: parts.next().map(str::to_string),
        region: parts.next().map(str::to_string),
        ..Default::default()
    }
}

// ─── Distance ────────────────────────────────────────────────────────────────

/// Great-circle (haversine) distance in miles.
pub fn distance_miles(from: Coordinates, to: Coordinates) -> f64 {
    Haversine.distance(from.to_point(), to.to_point()) / METERS_PER_MILE
}

/// Human-readable distance: "< 0.1 mi", "2.4 mi", "12 mi".
pub fn format_distance(miles: f64) -> String {
    if !miles.is_finite() || miles < 0.0 {
        return "--".to_string();
    }
    if miles < 0.1 {
        "< 0.1 mi".to_string()
    } else if miles < 10.0 {
        format!("{:.1} mi", miles)
    } else {
        format!("{:.0} mi", miles)
    }
}

pub fn is_within_radius(center: Coordinates, point: Coordinates, radius_miles: f64) -> bool {
    distance_miles(center, point) <= radius_miles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_known_pair() {
        // Lower Manhattan to downtown Brooklyn, about 4 miles
        let manhattan = Coordinates::new(40.7128, -74.0060);
        let brooklyn = Coordinates::new(40.6782, -73.9442);
        let d = distance_miles(manhattan, brooklyn);
        assert!((d - 4.2).abs() < 0.5, "unexpected distance {}", d);
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.05), "< 0.1 mi");
        assert_eq!(format_distance(2.44), "2.4 mi");
        assert_eq!(format_distance(12.6), "13 mi");
        assert_eq!(format_distance(f64::NAN), "--");
    }

    #[test]
    fn test_is_within_radius() {
        let center = Coordinates::new(40.71, -74.0);
        assert!(is_within_radius(center, Coordinates::new(40.72, -74.01), 5.0));
        assert!(!is_within_radius(center, Coordinates::new(41.71, -74.0), 5.0));
    }

    #[test]
    fn test_address_from_label() {
        let address = address_from_label("New York, NY");
        assert_eq!(address.city.as_deref(), Some("New York"));
        assert_eq!(address.region.as_deref(), Some("NY"));

        let address = address_from_label("Atlanta");
        assert_eq!(address.city.as_deref(), Some("Atlanta"));
        assert_eq!(address.region, None);
    }
}
