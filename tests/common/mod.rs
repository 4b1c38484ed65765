// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use braidbook::config::Config;
use braidbook::db::LocalDb;
use braidbook::error::{AppError, Result};
use braidbook::models::{
    Address, Coordinates, IdentityUser, NewUserProfile, Role, SessionTokens, UserProfile,
};
use braidbook::services::{
    AuthEvent, AuthEventKind, AuthManager, IdentityProvider, LocationProvider, PermissionStatus,
    ProfileRepository, SessionStore, SignUpCredentials, SignUpOutcome,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// In-process identity provider with switchable failures.
#[allow(dead_code)]
pub struct FakeIdentity {
    /// email -> (password, user)
    accounts: Mutex<HashMap<String, (String, IdentityUser)>>,
    session: Mutex<Option<SessionTokens>>,
    events: broadcast::Sender<AuthEvent>,
    seq: AtomicU64,
    next_id: AtomicU64,
    pub fail_sign_out: AtomicBool,
    pub fail_get_session: AtomicBool,
    /// The next session check finds the refresh token rejected: the session
    /// is dropped and `SignedOut` is pushed, as the BaaS client does.
    pub reject_refresh: AtomicBool,
    pub sign_in_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeIdentity {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            events,
            seq: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
            fail_sign_out: AtomicBool::new(false),
            fail_get_session: AtomicBool::new(false),
            reject_refresh: AtomicBool::new(false),
            sign_in_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        })
    }

    /// Register an account and return its user ID.
    pub fn add_account(&self, email: &str, password: &str) -> String {
        let id = format!("user-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let user = IdentityUser {
            id: id.clone(),
            email: Some(email.to_string()),
            email_confirmed_at: None,
        };
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), user));
        id
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.accounts.lock().unwrap().contains_key(email)
    }

    /// Install a session as if it had been restored from storage. No event.
    pub fn restore_session(&self, user_id: &str) {
        *self.session.lock().unwrap() = Some(tokens_for(user_id));
    }

    pub fn session(&self) -> Option<SessionTokens> {
        self.session.lock().unwrap().clone()
    }

    /// End the session from the provider side and push `SignedOut`.
    pub fn revoke_session(&self) {
        let user_id = self.session.lock().unwrap().take().map(|s| s.user.id);
        self.emit(AuthEventKind::SignedOut, user_id);
    }

    pub fn emit(&self, kind: AuthEventKind, user_id: Option<String>) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.events.send(AuthEvent { seq, kind, user_id });
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<SessionTokens> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let user = match self.accounts.lock().unwrap().get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => return Err(AppError::Auth("Invalid login credentials".to_string())),
        };
        let tokens = tokens_for(&user.id);
        *self.session.lock().unwrap() = Some(tokens.clone());
        self.emit(AuthEventKind::SignedIn, Some(user.id));
        Ok(tokens)
    }

    async fn sign_up(&self, credentials: &SignUpCredentials) -> Result<SignUpOutcome> {
        if self.has_account(&credentials.email) {
            return Err(AppError::Auth("User already registered".to_string()));
        }
        let id = self.add_account(&credentials.email, &credentials.password);
        let tokens = tokens_for(&id);
        *self.session.lock().unwrap() = Some(tokens.clone());
        self.emit(AuthEventKind::SignedIn, Some(id));
        Ok(SignUpOutcome {
            user: tokens.user.clone(),
            session: Some(tokens),
        })
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        let user_id = self.session.lock().unwrap().take().map(|s| s.user.id);
        self.emit(AuthEventKind::SignedOut, user_id);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AppError::network());
        }
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<SessionTokens>> {
        if self.fail_get_session.load(Ordering::SeqCst) {
            return Err(AppError::network());
        }
        if self.reject_refresh.swap(false, Ordering::SeqCst) {
            if let Some(ended) = self.session.lock().unwrap().take() {
                self.emit(AuthEventKind::SignedOut, Some(ended.user.id));
            }
            return Ok(None);
        }
        Ok(self.session())
    }

    async fn get_user(&self) -> Result<Option<IdentityUser>> {
        Ok(self.get_session().await?.map(|s| s.user))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn last_event_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }
}

/// In-process profile table.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeProfiles {
    rows: Mutex<HashMap<String, UserProfile>>,
    pub fail_fetch: AtomicBool,
    pub fail_insert: AtomicBool,
    /// Milliseconds each profile fetch waits before answering.
    pub fetch_delay_ms: AtomicU64,
}

#[allow(dead_code)]
impl FakeProfiles {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, profile: UserProfile) {
        self.rows
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile);
    }

    pub fn get(&self, id: &str) -> Option<UserProfile> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    pub fn update(&self, id: &str, f: impl FnOnce(&mut UserProfile)) {
        if let Some(profile) = self.rows.lock().unwrap().get_mut(id) {
            f(profile);
        }
    }
}

#[async_trait]
impl ProfileRepository for FakeProfiles {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(AppError::network());
        }
        let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(self.get(user_id))
    }

    async fn insert_profile(&self, profile: &NewUserProfile) -> Result<UserProfile> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(AppError::Api {
                status: 409,
                message: "duplicate key value violates unique constraint".to_string(),
            });
        }
        let row = UserProfile {
            id: profile.id.clone(),
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            role: profile.role,
            is_email_verified: profile.is_email_verified,
            avatar: None,
            phone: profile.phone.clone(),
        };
        self.insert(row.clone());
        Ok(row)
    }
}

/// Location provider returning a scripted outcome.
#[allow(dead_code)]
pub struct FakeLocation {
    pub permission: PermissionStatus,
    pub position: Option<Coordinates>,
    pub delay: Duration,
    pub address: Option<Address>,
    pub position_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeLocation {
    pub fn granted(latitude: f64, longitude: f64) -> Self {
        Self {
            permission: PermissionStatus::Granted,
            position: Some(Coordinates::new(latitude, longitude)),
            delay: Duration::ZERO,
            address: None,
            position_calls: AtomicUsize::new(0),
        }
    }

    pub fn denied() -> Self {
        Self {
            permission: PermissionStatus::Denied,
            position: None,
            delay: Duration::ZERO,
            address: None,
            position_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LocationProvider for FakeLocation {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.permission)
    }

    async fn current_position(&self) -> Result<Coordinates> {
        self.position_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.position
            .ok_or_else(|| AppError::Location("no fix".to_string()))
    }

    async fn reverse_geocode(&self, _coordinates: Coordinates) -> Result<Option<Address>> {
        match &self.address {
            Some(address) => Ok(Some(address.clone())),
            None => Err(AppError::Location("geocoder offline".to_string())),
        }
    }
}

/// Session tokens for `user_id`, valid for an hour.
#[allow(dead_code)]
pub fn tokens_for(user_id: &str) -> SessionTokens {
    SessionTokens {
        access_token: format!("access-{}", user_id),
        refresh_token: format!("refresh-{}", user_id),
        expires_at: chrono::Utc::now().timestamp() + 3600,
        user: IdentityUser {
            id: user_id.to_string(),
            email: None,
            email_confirmed_at: None,
        },
    }
}

#[allow(dead_code)]
pub fn profile(id: &str, email: &str, first: &str, last: &str, role: Role) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: email.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        role,
        is_email_verified: true,
        avatar: None,
        phone: None,
    }
}

/// Auth manager over the fakes and a fresh in-memory store.
#[allow(dead_code)]
pub fn test_auth(
    identity: &Arc<FakeIdentity>,
    profiles: &Arc<FakeProfiles>,
) -> (Arc<AuthManager>, SessionStore) {
    let sessions = SessionStore::new(LocalDb::in_memory());
    let auth = AuthManager::new(identity.clone(), profiles.clone(), sessions.clone());
    (auth, sessions)
}

/// Test config pointing both backends at `base_url`.
#[allow(dead_code)]
pub fn test_config(base_url: &str) -> Config {
    Config {
        api_base_url: base_url.to_string(),
        baas_url: base_url.to_string(),
        http_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

/// Stylist row as the REST API returns it.
#[allow(dead_code)]
pub fn stylist_json(id: &str, business_name: &str, latitude: f64, longitude: f64, distance: f64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "businessName": business_name,
        "bio": "Protective styles",
        "specialties": ["knotless", "box braids"],
        "experience": "5+ years",
        "location": {
            "address": "1 Main St",
            "city": "New York",
            "state": "NY",
            "coordinates": { "latitude": latitude, "longitude": longitude }
        },
        "serviceRadius": 15.0,
        "rating": 4.8,
        "reviewCount": 120,
        "isVerified": true,
        "isAvailable": true,
        "distance": distance
    })
}
