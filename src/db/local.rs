// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed wrapper over the key/value backend.
//!
//! Provides high-level operations for:
//! - User snapshot and onboarding flag (session store)
//! - Identity-provider session tokens
//! - Favorite stylists
//! - Last known location

use std::path::PathBuf;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use super::{keys, FileStore, KeyValueStore, MemoryStore};
use crate::error::{AppError, Result};
use crate::models::{AuthenticatedUser, LocationResult, SessionTokens};

/// Local database handle. Cheap to clone.
#[derive(Clone)]
pub struct LocalDb {
    store: Arc<dyn KeyValueStore>,
}

impl LocalDb {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Open device storage at `path`.
    pub fn open_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::debug!(path = %path.display(), "Using file-backed local storage");
        Self::new(Arc::new(FileStore::new(path)))
    }

    /// Volatile storage (tests / offline mode).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Raw backend access.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| AppError::Storage(format!("Corrupt value for '{}': {}", key, e))),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| AppError::Storage(format!("Failed to serialize '{}': {}", key, e)))?;
        self.store.set(key, &raw).await
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self) -> Result<Option<AuthenticatedUser>> {
        self.get_json(keys::USER).await
    }

    pub async fn set_user(&self, user: &AuthenticatedUser) -> Result<()> {
        self.set_json(keys::USER, user).await
    }

    pub async fn get_needs_onboarding(&self) -> Result<bool> {
        Ok(self.store.get(keys::NEEDS_ONBOARDING).await?.as_deref() == Some("true"))
    }

    /// Stores `"true"`, or removes the key when clearing.
    pub async fn set_needs_onboarding(&self, needs: bool) -> Result<()> {
        if needs {
            self.store.set(keys::NEEDS_ONBOARDING, "true").await
        } else {
            self.store.remove(keys::NEEDS_ONBOARDING).await
        }
    }

    /// Remove the user snapshot and onboarding flag together.
    pub async fn delete_user(&self) -> Result<()> {
        self.store
            .remove_many(&[keys::USER, keys::NEEDS_ONBOARDING])
            .await
    }

    // ─── Token Operations ────────────────────────────────────────

    pub async fn get_tokens(&self) -> Result<Option<SessionTokens>> {
        self.get_json(keys::AUTH_TOKENS).await
    }

    pub async fn set_tokens(&self, tokens: &SessionTokens) -> Result<()> {
        self.set_json(keys::AUTH_TOKENS, tokens).await
    }

    pub async fn delete_tokens(&self) -> Result<()> {
        self.store.remove(keys::AUTH_TOKENS).await
    }

    // ─── Favorites ───────────────────────────────────────────────

    pub async fn get_favorites(&self) -> Result<Vec<String>> {
        Ok(self
            .get_json::<Vec<String>>(keys::FAVORITE_STYLISTS)
            .await?
            .unwrap_or_default())
    }

    pub async fn set_favorites(&self, ids: &[String]) -> Result<()> {
        self.set_json(keys::FAVORITE_STYLISTS, ids).await
    }

    // ─── Location ────────────────────────────────────────────────

    pub async fn get_last_location(&self) -> Result<Option<LocationResult>> {
        self.get_json(keys::LAST_KNOWN_LOCATION).await
    }

    pub async fn set_last_location(&self, location: &LocationResult) -> Result<()> {
        self.set_json(keys::LAST_KNOWN_LOCATION, location).await
    }
}
