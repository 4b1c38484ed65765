// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! On-device storage layer.
//!
//! `LocalDb` provides typed operations over a string key/value backend.
//! Backends: a JSON file (device storage) and an in-memory map.

pub mod file_store;
pub mod local;
pub mod memory_store;

pub use file_store::FileStore;
pub use local::LocalDb;
pub use memory_store::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;

/// Storage keys as constants.
pub mod keys {
    /// Serialized `AuthenticatedUser` snapshot
    pub const USER: &str = "user";
    /// `"true"` or absent
    pub const NEEDS_ONBOARDING: &str = "needsOnboarding";
    /// Serialized array of stylist IDs
    pub const FAVORITE_STYLISTS: &str = "favoriteStylists";
    /// Serialized `LocationResult`
    pub const LAST_KNOWN_LOCATION: &str = "lastKnownLocation";
    /// Serialized `SessionTokens`, written by the identity provider only
    pub const AUTH_TOKENS: &str = "authTokens";
}

/// String key/value persistence backend.
///
/// Implementations must treat removing a missing key as a no-op.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove several keys. Backends may override to do it in one write.
    async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}
