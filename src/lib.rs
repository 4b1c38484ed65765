// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Braidbook: client-side session and data-access layer for a braiding
//! marketplace.
//!
//! This crate restores and tracks the signed-in user against a hosted
//! identity provider, and wraps the booking/search REST API, device-local
//! favorites and location resolution behind typed services.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::LocalDb;
use error::Result;
use services::{
    ApiClient, AuthManager, BaasClient, BookingService, FavoritesService, LocationProvider,
    LocationService, SessionStore,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: LocalDb,
    pub api: ApiClient,
    pub auth: Arc<AuthManager>,
    pub bookings: BookingService,
    pub favorites: FavoritesService,
    pub location: LocationService,
}

impl AppState {
    /// Wire every service against the file-backed store at `config.storage_path`.
    pub fn from_config(config: Config, location_provider: Arc<dyn LocationProvider>) -> Result<Self> {
        let db = LocalDb::open_file(&config.storage_path);
        Self::new(config, db, location_provider)
    }

    /// Wire every service against an existing store.
    pub fn new(
        config: Config,
        db: LocalDb,
        location_provider: Arc<dyn LocationProvider>,
    ) -> Result<Self> {
        let api = ApiClient::new(&config.api_base_url, db.clone(), config.http_timeout)?;
        let baas = Arc::new(BaasClient::new(
            &config.baas_url,
            &config.baas_anon_key,
            db.clone(),
            config.http_timeout,
        )?);
        let auth = AuthManager::new(baas.clone(), baas, SessionStore::new(db.clone()));

        Ok(Self {
            bookings: BookingService::new(api.clone()),
            favorites: FavoritesService::new(db.clone()),
            location: LocationService::new(location_provider, db.clone(), &config),
            config,
            db,
            api,
            auth,
        })
    }
}
