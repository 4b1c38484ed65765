// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Braidbook session probe
//!
//! Restores the stored session, resolves a location and runs a nearby-stylist
//! search, printing the result envelope as JSON.

use std::sync::Arc;

use braidbook::{
    config::Config, error::Envelope, services::UnavailableLocationProvider, AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Search radius in miles.
const NEARBY_RADIUS_MILES: f64 = 10.0;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(
        flavor = ?config.flavor,
        api = %config.api_base_url,
        storage = %config.storage_path.display(),
        "Starting Braidbook session probe"
    );

    let state = AppState::from_config(config, Arc::new(UnavailableLocationProvider))?;

    let auth_state = state.auth.initialize().await;
    match auth_state.user() {
        Some(user) => tracing::info!(user_id = %user.id, role = %user.role, "Session restored"),
        None => tracing::info!("No active session"),
    }

    let location = state.location.get_current_location().await;
    tracing::info!(
        source = ?location.source,
        latitude = location.coordinates.latitude,
        longitude = location.coordinates.longitude,
        "Location resolved"
    );

    let result = state
        .bookings
        .get_nearby_stylists(&location, NEARBY_RADIUS_MILES)
        .await;
    let envelope = Envelope::from_response(result);
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    Ok(())
}

/// Structured JSON logging. `RUST_LOG` overrides the default filter.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("braidbook=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
