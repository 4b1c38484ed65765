// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! The REST API base URL depends on the build flavor; the BaaS URL and its
//! public anon key are always required.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::Coordinates;

/// Build flavor, selects the default REST API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildFlavor {
    Development,
    Production,
}

impl BuildFlavor {
    /// Default REST API base URL for this flavor.
    pub fn default_api_base_url(self) -> &'static str {
        match self {
            BuildFlavor::Development => "http://localhost:3000/api",
            BuildFlavor::Production => "https://api.braidbook.app/api",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildFlavor::Development),
            "production" | "prod" => Ok(BuildFlavor::Production),
            _ => Err(ConfigError::Invalid("APP_ENV", value.to_string())),
        }
    }
}

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub flavor: BuildFlavor,
    /// REST API base URL (booking/search domain)
    pub api_base_url: String,
    /// BaaS project URL (auth + profile table)
    pub baas_url: String,
    /// BaaS public anon key
    pub baas_anon_key: String,
    /// JSON file backing on-device storage
    pub storage_path: PathBuf,
    pub http_timeout: Duration,

    // --- Location ---
    /// Max age of the in-memory location cache
    pub location_cache_max_age: Duration,
    /// Max age of the persisted last-known location
    pub last_known_max_age: Duration,
    /// How long to wait for a device fix
    pub device_location_timeout: Duration,
    /// Used when every other location source fails
    pub fallback_location: Coordinates,
    pub fallback_label: String,
}

/// New York, NY.
pub const FALLBACK_COORDINATES: Coordinates = Coordinates {
    latitude: 40.7128,
    longitude: -74.0060,
};

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            flavor: BuildFlavor::Development,
            api_base_url: BuildFlavor::Development.default_api_base_url().to_string(),
            baas_url: "http://localhost:54321".to_string(),
            baas_anon_key: "test_anon_key".to_string(),
            storage_path: env::temp_dir().join("braidbook-test-storage.json"),
            http_timeout: Duration::from_secs(30),
            location_cache_max_age: Duration::from_secs(5 * 60),
            last_known_max_age: Duration::from_secs(24 * 60 * 60),
            device_location_timeout: Duration::from_secs(10),
            fallback_location: FALLBACK_COORDINATES,
            fallback_label: "New York, NY".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let flavor = match env::var("APP_ENV") {
            Ok(v) => BuildFlavor::parse(&v)?,
            Err(_) => BuildFlavor::Development,
        };

        let storage_path = match env::var("STORAGE_PATH") {
            Ok(p) => PathBuf::from(p),
            Err(_) => dirs::data_local_dir()
                .unwrap_or_else(env::temp_dir)
                .join("braidbook")
                .join("storage.json"),
        };

        let defaults = Self::default();

        Ok(Self {
            flavor,
            api_base_url: env::var("API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| flavor.default_api_base_url().to_string()),
            baas_url: env::var("BAAS_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("BAAS_URL"))?,
            baas_anon_key: env::var("BAAS_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("BAAS_ANON_KEY"))?,
            storage_path,
            http_timeout: secs_var("HTTP_TIMEOUT_SECS", defaults.http_timeout)?,
            location_cache_max_age: secs_var(
                "LOCATION_CACHE_SECS",
                defaults.location_cache_max_age,
            )?,
            last_known_max_age: secs_var("LAST_KNOWN_LOCATION_SECS", defaults.last_known_max_age)?,
            device_location_timeout: secs_var(
                "DEVICE_LOCATION_TIMEOUT_SECS",
                defaults.device_location_timeout,
            )?,
            fallback_location: defaults.fallback_location,
            fallback_label: defaults.fallback_label,
        })
    }
}

/// Read a duration in whole seconds, falling back to `default` when unset.
fn secs_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid(name, v)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
