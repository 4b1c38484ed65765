// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity-provider and profile-repository seams.
//!
//! The auth manager talks to the BaaS only through these traits so tests can
//! substitute in-process fakes.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::models::{IdentityUser, NewUserProfile, Role, SessionTokens, UserProfile};

/// Kind of provider-pushed session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Session-change notification.
///
/// `seq` increases by one per event emitted by a provider instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub seq: u64,
    pub kind: AuthEventKind,
    pub user_id: Option<String>,
}

/// Credentials and metadata for creating an identity account.
#[derive(Debug, Clone)]
pub struct SignUpCredentials {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone: Option<String>,
}

/// Result of account creation. `session` is absent when the provider requires
/// email confirmation before issuing tokens.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: IdentityUser,
    pub session: Option<SessionTokens>,
}

/// Hosted identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Password sign-in. Emits `SignedIn` on success.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<SessionTokens>;

    /// Create an identity account. Emits `SignedIn` when a session is issued.
    async fn sign_up(&self, credentials: &SignUpCredentials) -> Result<SignUpOutcome>;

    /// Invalidate the current session. Local session data is dropped even when
    /// the remote call fails; the remote error is still returned.
    async fn sign_out(&self) -> Result<()>;

    /// Current session, refreshed first if it is about to expire.
    async fn get_session(&self) -> Result<Option<SessionTokens>>;

    /// Identity user for the current session, validated by the provider.
    async fn get_user(&self) -> Result<Option<IdentityUser>>;

    /// Subscribe to session-change events.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Sequence number of the most recently emitted event (0 if none).
    fn last_event_seq(&self) -> u64;
}

/// The `users` profile table.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    async fn insert_profile(&self, profile: &NewUserProfile) -> Result<UserProfile>;
}
