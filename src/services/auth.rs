// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth manager: single source of truth for who is signed in.
//!
//! State machine:
//! `Uninitialized -> Loading -> {Authenticated, Unauthenticated}`, with
//! sign-in/sign-up moving to `Authenticated` and sign-out or a revoked session
//! moving to `Unauthenticated`. Failed operations never change the state.
//!
//! Every transition, whether caused by an explicit call or by a session event
//! pushed from the identity provider, runs under one async mutex. Before an
//! operation publishes, it records the provider's event sequence and then
//! reads the provider session. Events up to that sequence are reflected in
//! what it read and are skipped by the listener; anything emitted later is
//! newer than the published state and is resolved again. An operation whose
//! outcome no longer matches the provider session (a revocation landed while
//! it ran, or a failed sign-in replaced the previous session) publishes the
//! resolved provider state instead.

use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{AuthenticatedUser, NewUserProfile, Role, SignUpRequest};
use crate::services::identity::{
    AuthEvent, IdentityProvider, ProfileRepository, SignUpCredentials,
};
use crate::services::session::SessionStore;

/// Published auth state. The user only exists inside `Authenticated`.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Uninitialized,
    Loading,
    Authenticated {
        user: AuthenticatedUser,
        needs_onboarding: bool,
    },
    Unauthenticated,
}

impl AuthState {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            AuthState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    /// True until the first session check has finished.
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Uninitialized | AuthState::Loading)
    }

    pub fn needs_onboarding(&self) -> bool {
        matches!(
            self,
            AuthState::Authenticated {
                needs_onboarding: true,
                ..
            }
        )
    }
}

/// Bookkeeping guarded by the transition mutex.
#[derive(Debug, Default)]
struct Transitions {
    /// Provider events up to this sequence are already reflected in the state.
    acknowledged_seq: u64,
}

impl Transitions {
    fn acknowledge(&mut self, seq: u64) {
        self.acknowledged_seq = self.acknowledged_seq.max(seq);
    }
}

/// Orchestrates sign-in, sign-up, sign-out and session restoration.
pub struct AuthManager {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepository>,
    sessions: SessionStore,
    state: watch::Sender<AuthState>,
    transitions: Mutex<Transitions>,
    listener: StdMutex<Option<JoinHandle<()>>>,
}

impl AuthManager {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileRepository>,
        sessions: SessionStore,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(AuthState::Uninitialized);
        Arc::new(Self {
            identity,
            profiles,
            sessions,
            state,
            transitions: Mutex::new(Transitions::default()),
            listener: StdMutex::new(None),
        })
    }

    // ─── Reactive State ──────────────────────────────────────────────────────

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every published state.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<AuthenticatedUser> {
        self.state.borrow().user().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn needs_onboarding(&self) -> bool {
        self.state.borrow().needs_onboarding()
    }

    /// Publish `next`, notifying receivers only when it differs.
    fn publish(&self, next: AuthState) {
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Publish the outcome of an explicit operation. Caller holds the
    /// transition lock.
    ///
    /// The outcome stands only if the provider session still belongs to the
    /// user it names. Otherwise the provider changed underneath the operation
    /// and its current session is resolved and published instead.
    async fn settle(&self, transitions: &mut Transitions, outcome: AuthState) -> AuthState {
        let observed = self.identity.last_event_seq();
        let expected = outcome
            .user()
            .and_then(|user| user.session.as_ref())
            .map(|session| session.user.id.clone());

        let next = match self.identity.get_session().await {
            Ok(session) if session.as_ref().map(|s| s.user.id.as_str()) == expected.as_deref() => {
                outcome
            }
            Ok(_) => {
                tracing::warn!("Provider session changed during operation, resolving again");
                let observed = self.identity.last_event_seq();
                let resolved = self.resolve_session().await;
                transitions.acknowledge(observed);
                self.publish(resolved.clone());
                return resolved;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not confirm provider session");
                outcome
            }
        };

        transitions.acknowledge(observed);
        self.publish(next.clone());
        next
    }

    // ─── Session Restoration ─────────────────────────────────────────────────

    /// Restore the session on startup and start following provider events.
    ///
    /// Fails closed: any problem resolving the session or its profile yields
    /// `Unauthenticated`.
    pub async fn initialize(self: &Arc<Self>) -> AuthState {
        let mut transitions = self.transitions.lock().await;
        self.publish(AuthState::Loading);

        // Subscribe before resolving so no change slips between the two.
        self.start_listener(self.identity.subscribe());

        let observed = self.identity.last_event_seq();
        let next = self.resolve_session().await;
        transitions.acknowledge(observed);
        self.publish(next.clone());

        tracing::info!(
            authenticated = next.is_authenticated(),
            "Session restore finished"
        );
        next
    }

    fn start_listener(self: &Arc<Self>, events: broadcast::Receiver<AuthEvent>) {
        let mut slot = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        *slot = Some(tokio::spawn(listen(Arc::downgrade(self), events)));
    }

    /// Re-resolve after a provider-pushed session change.
    async fn apply_pushed_change(&self, seq: u64) {
        let mut transitions = self.transitions.lock().await;
        if seq <= transitions.acknowledged_seq {
            tracing::debug!(seq, "Session event already reflected, skipping");
            return;
        }

        let observed = self.identity.last_event_seq();
        let next = self.resolve_session().await;
        transitions.acknowledge(observed);
        tracing::info!(
            seq,
            authenticated = next.is_authenticated(),
            "Session changed by provider"
        );
        self.publish(next);
    }

    /// Provider session -> profile -> state. Caller holds the transition lock.
    async fn resolve_session(&self) -> AuthState {
        let session = match self.identity.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::debug!("No provider session");
                self.clear_local().await;
                return AuthState::Unauthenticated;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session check failed, treating as signed out");
                return AuthState::Unauthenticated;
            }
        };

        let user_id = session.user.id.clone();
        match self.profiles.fetch_profile(&user_id).await {
            Ok(Some(profile)) => {
                let user = AuthenticatedUser::from_profile(profile, Some(session));
                self.persist_user(&user).await;
                let needs_onboarding = self.read_onboarding_flag().await;
                AuthState::Authenticated {
                    user,
                    needs_onboarding,
                }
            }
            Ok(None) => {
                tracing::warn!(user_id = %user_id, "Session has no profile, treating as signed out");
                self.clear_local().await;
                AuthState::Unauthenticated
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Profile fetch failed, treating as signed out");
                AuthState::Unauthenticated
            }
        }
    }

    // ─── Explicit Operations ─────────────────────────────────────────────────

    /// Sign in and check the account's role.
    ///
    /// Valid credentials for an account of a different role still fail with
    /// `RoleMismatch`. On failure the state is left as it was unless the
    /// attempt cost the previous user their provider session, in which case
    /// the manager signs out locally. A revocation pushed while the sign-in
    /// was in flight wins and the call fails with `Unauthorized`.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        expected_role: Role,
    ) -> Result<AuthenticatedUser> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let mut transitions = self.transitions.lock().await;
        let previous = self.state();
        let signed_in = self.sign_in_locked(email, password, expected_role).await;
        let (user, needs_onboarding) = match signed_in {
            Ok(signed_in) => signed_in,
            Err(e) => {
                self.settle(&mut transitions, previous).await;
                return Err(e);
            }
        };

        let outcome = AuthState::Authenticated {
            user: user.clone(),
            needs_onboarding,
        };
        let settled = self.settle(&mut transitions, outcome).await;
        if settled.user().map(|u| &u.id) != Some(&user.id) {
            tracing::warn!(user_id = %user.id, "Session ended while signing in");
            return Err(AppError::Unauthorized);
        }
        tracing::info!(user_id = %user.id, role = %user.role, "Signed in");
        Ok(user)
    }

    async fn sign_in_locked(
        &self,
        email: &str,
        password: &str,
        expected_role: Role,
    ) -> Result<(AuthenticatedUser, bool)> {
        let session = self.identity.sign_in_with_password(email, password).await?;
        let user_id = session.user.id.clone();

        let profile = match self.profiles.fetch_profile(&user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                self.discard_provider_session().await;
                return Err(AppError::ProfileNotFound(user_id));
            }
            Err(e) => {
                self.discard_provider_session().await;
                return Err(e);
            }
        };

        if profile.role != expected_role {
            tracing::warn!(
                user_id = %user_id,
                expected = %expected_role,
                actual = %profile.role,
                "Role mismatch at sign-in"
            );
            self.discard_provider_session().await;
            return Err(AppError::RoleMismatch {
                expected: expected_role,
                actual: profile.role,
            });
        }

        let user = AuthenticatedUser::from_profile(profile, Some(session));
        self.persist_user(&user).await;
        let needs_onboarding = self.read_onboarding_flag().await;
        Ok((user, needs_onboarding))
    }

    /// Create the identity account and its profile, then sign in as it.
    ///
    /// A profile failure after the identity account exists is a hard failure;
    /// the identity account is left in place.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<AuthenticatedUser> {
        request.validate()?;

        let mut transitions = self.transitions.lock().await;
        let previous = self.state();
        let user = match self.sign_up_locked(&request).await {
            Ok(user) => user,
            Err(e) => {
                self.settle(&mut transitions, previous).await;
                return Err(e);
            }
        };

        let outcome = AuthState::Authenticated {
            user: user.clone(),
            needs_onboarding: true,
        };
        let settled = self.settle(&mut transitions, outcome).await;
        if settled.user().map(|u| &u.id) != Some(&user.id) {
            tracing::warn!(user_id = %user.id, "Session ended while signing up");
            return Err(AppError::Unauthorized);
        }
        tracing::info!(user_id = %user.id, role = %user.role, "Signed up");
        Ok(user)
    }

    async fn sign_up_locked(&self, request: &SignUpRequest) -> Result<AuthenticatedUser> {
        let credentials = SignUpCredentials {
            email: request.email.trim().to_string(),
            password: request.password.clone(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            role: request.role,
            phone: request.phone.clone(),
        };
        let outcome = self.identity.sign_up(&credentials).await?;

        let new_profile = NewUserProfile {
            id: outcome.user.id.clone(),
            email: credentials.email,
            first_name: credentials.first_name,
            last_name: credentials.last_name,
            role: credentials.role,
            is_email_verified: false,
            phone: credentials.phone,
        };

        let profile = match self.profiles.insert_profile(&new_profile).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(
                    user_id = %new_profile.id,
                    error = %e,
                    "Profile creation failed after identity account was created"
                );
                if outcome.session.is_some() {
                    self.discard_provider_session().await;
                }
                return Err(AppError::ProfileCreation(e.to_string()));
            }
        };

        let user = AuthenticatedUser::from_profile(profile, outcome.session);
        self.persist_user(&user).await;
        if let Err(e) = self.sessions.set_needs_onboarding(true).await {
            tracing::warn!(error = %e, "Failed to persist onboarding flag");
        }
        Ok(user)
    }

    /// Sign out. The provider call is best-effort; local cleanup always runs
    /// and the state always ends `Unauthenticated`.
    pub async fn sign_out(&self) {
        let mut transitions = self.transitions.lock().await;

        if let Err(e) = self.identity.sign_out().await {
            tracing::warn!(error = %e, "Provider sign-out failed, clearing local session anyway");
        }
        self.clear_local().await;

        // Anything the provider emits after this point is resolved by the
        // listener.
        transitions.acknowledge(self.identity.last_event_seq());
        self.publish(AuthState::Unauthenticated);
        tracing::info!("Signed out");
    }

    /// Clear the onboarding flag.
    pub async fn complete_onboarding(&self) -> Result<()> {
        let _transitions = self.transitions.lock().await;
        self.sessions.set_needs_onboarding(false).await?;
        self.state.send_modify(|state| {
            if let AuthState::Authenticated {
                needs_onboarding, ..
            } = state
            {
                *needs_onboarding = false;
            }
        });
        Ok(())
    }

    /// Re-fetch the profile and replace the user snapshot.
    ///
    /// Returns `Ok(None)` without doing anything when nobody is signed in. If
    /// the provider no longer has a session for the user, local data is
    /// cleared, the state moves to `Unauthenticated` and `Ok(None)` is
    /// returned.
    pub async fn refresh_profile(&self) -> Result<Option<AuthenticatedUser>> {
        let mut transitions = self.transitions.lock().await;
        let previous = self.state();
        let needs_onboarding = match &previous {
            AuthState::Authenticated {
                needs_onboarding, ..
            } => *needs_onboarding,
            _ => return Ok(None),
        };

        let user = match self.refresh_profile_locked().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::info!("Provider session gone, signing out locally");
                self.clear_local().await;
                self.settle(&mut transitions, AuthState::Unauthenticated).await;
                return Ok(None);
            }
            Err(e) => {
                self.settle(&mut transitions, previous).await;
                return Err(e);
            }
        };

        let outcome = AuthState::Authenticated {
            user: user.clone(),
            needs_onboarding,
        };
        let settled = self.settle(&mut transitions, outcome).await;
        if settled.user().map(|u| &u.id) != Some(&user.id) {
            return Ok(None);
        }
        tracing::debug!(user_id = %user.id, "Profile refreshed");
        Ok(Some(user))
    }

    async fn refresh_profile_locked(&self) -> Result<Option<AuthenticatedUser>> {
        let identity_user = match self.identity.get_user().await? {
            Some(user) => user,
            None => return Ok(None),
        };

        let profile = self
            .profiles
            .fetch_profile(&identity_user.id)
            .await?
            .ok_or_else(|| AppError::ProfileNotFound(identity_user.id.clone()))?;
        let session = self.identity.get_session().await?;

        let user = AuthenticatedUser::from_profile(profile, session);
        self.persist_user(&user).await;
        Ok(Some(user))
    }

    // ─── Helpers ─────────────────────────────────────────────────────────────

    async fn persist_user(&self, user: &AuthenticatedUser) {
        if let Err(e) = self.sessions.save(user).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to persist user snapshot");
        }
    }

    async fn read_onboarding_flag(&self) -> bool {
        self.sessions.needs_onboarding().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read onboarding flag");
            false
        })
    }

    async fn clear_local(&self) {
        if let Err(e) = self.sessions.clear().await {
            tracing::warn!(error = %e, "Failed to clear session store");
        }
    }

    /// Drop a provider session that was opened but must not be used.
    async fn discard_provider_session(&self) {
        if let Err(e) = self.identity.sign_out().await {
            tracing::warn!(error = %e, "Failed to discard provider session");
        }
    }
}

impl Drop for AuthManager {
    fn drop(&mut self) {
        if let Some(handle) = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

/// Forward provider events to the manager until either side goes away.
async fn listen(manager: Weak<AuthManager>, mut events: broadcast::Receiver<AuthEvent>) {
    loop {
        let seq = match events.recv().await {
            Ok(event) => {
                tracing::debug!(seq = event.seq, kind = ?event.kind, "Session event received");
                event.seq
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Session events lagged, resyncing");
                u64::MAX
            }
            Err(RecvError::Closed) => break,
        };

        let Some(manager) = manager.upgrade() else {
            break;
        };
        manager.apply_pushed_change(seq).await;
    }
}
