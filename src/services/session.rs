// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store: the persisted user snapshot and onboarding flag.
//!
//! This is a cache of server truth. Whatever `load` returns may be stale and
//! is revalidated by the auth manager's session check.

use crate::db::LocalDb;
use crate::error::Result;
use crate::models::AuthenticatedUser;

/// Persists the current user snapshot.
#[derive(Clone)]
pub struct SessionStore {
    db: LocalDb,
}

impl SessionStore {
    pub fn new(db: LocalDb) -> Self {
        Self { db }
    }

    /// Persist the user snapshot. Saving the same user twice is a no-op in effect.
    pub async fn save(&self, user: &AuthenticatedUser) -> Result<()> {
        self.db.set_user(user).await
    }

    pub async fn load(&self) -> Result<Option<AuthenticatedUser>> {
        self.db.get_user().await
    }

    /// Remove the snapshot and onboarding flag. Clearing an empty store succeeds.
    pub async fn clear(&self) -> Result<()> {
        self.db.delete_user().await
    }

    pub async fn needs_onboarding(&self) -> Result<bool> {
        self.db.get_needs_onboarding().await
    }

    pub async fn set_needs_onboarding(&self, needs: bool) -> Result<()> {
        self.db.set_needs_onboarding(needs).await
    }
}
