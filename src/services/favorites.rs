// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device-local favorite stylists.
//!
//! Stored as an ordered, duplicate-free list of stylist IDs. Not synced to the
//! server and not cleared on sign-out.

use tokio::sync::Mutex;

use crate::db::LocalDb;
use crate::error::Result;

pub struct FavoritesService {
    db: LocalDb,
    /// Serializes read-modify-write cycles on the stored list.
    write_lock: Mutex<()>,
}

impl FavoritesService {
    pub fn new(db: LocalDb) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    /// Favorite stylist IDs in the order they were added.
    pub async fn get_favorite_stylists(&self) -> Result<Vec<String>> {
        self.db.get_favorites().await
    }

    /// Add a favorite. Adding one that is already present changes nothing.
    pub async fn add_favorite_stylist(&self, stylist_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut favorites = self.db.get_favorites().await?;
        if favorites.iter().any(|id| id == stylist_id) {
            return Ok(());
        }
        favorites.push(stylist_id.to_string());
        self.db.set_favorites(&favorites).await?;
        tracing::debug!(stylist_id, count = favorites.len(), "Favorite added");
        Ok(())
    }

    /// Remove a favorite. Removing an absent ID is a no-op.
    pub async fn remove_favorite_stylist(&self, stylist_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut favorites = self.db.get_favorites().await?;
        let before = favorites.len();
        favorites.retain(|id| id != stylist_id);
        if favorites.len() == before {
            return Ok(());
        }
        self.db.set_favorites(&favorites).await?;
        tracing::debug!(stylist_id, count = favorites.len(), "Favorite removed");
        Ok(())
    }

    pub async fn is_favorite(&self, stylist_id: &str) -> Result<bool> {
        Ok(self
            .db
            .get_favorites()
            .await?
            .iter()
            .any(|id| id == stylist_id))
    }

    /// Flip a stylist's favorite status. Returns whether it is now a favorite.
    pub async fn toggle_favorite(&self, stylist_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut favorites = self.db.get_favorites().await?;
        let now_favorite = match favorites.iter().position(|id| id == stylist_id) {
            Some(index) => {
                favorites.remove(index);
                false
            }
            None => {
                favorites.push(stylist_id.to_string());
                true
            }
        };
        self.db.set_favorites(&favorites).await?;
        Ok(now_favorite)
    }
}
