// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! BaaS client: hosted auth (GoTrue-style) and the `users` profile table
//! (PostgREST-style).
//!
//! Handles:
//! - Password sign-in, sign-up and sign-out
//! - Session persistence through local storage (`authTokens`)
//! - Token refresh when the access token is about to expire
//! - Session-change events for the auth manager
//! - Profile select/insert

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tokio::sync::{broadcast, Mutex};

use crate::db::LocalDb;
use crate::error::{AppError, Result};
use crate::models::{IdentityUser, NewUserProfile, SessionTokens, UserProfile};
use crate::services::api::error_message;
use crate::services::identity::{
    AuthEvent, AuthEventKind, IdentityProvider, ProfileRepository, SignUpCredentials,
    SignUpOutcome,
};

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Lifetime assumed when the provider omits both `expires_at` and `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 60 * 60;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Profile table name.
const USERS_TABLE: &str = "users";

/// Token grant response.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: IdentityUser,
}

impl TokenResponse {
    fn into_tokens(self) -> SessionTokens {
        let expires_at = self.expires_at.unwrap_or_else(|| {
            Utc::now().timestamp() + self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
        });
        SessionTokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// BaaS client. Clones share the event channel and refresh lock.
#[derive(Clone)]
pub struct BaasClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    db: LocalDb,
    events: broadcast::Sender<AuthEvent>,
    seq: Arc<AtomicU64>,
    /// Serializes token refreshes so a refresh token is only spent once.
    refresh_lock: Arc<Mutex<()>>,
}

impl BaasClient {
    /// Create a client for the project at `base_url`.
    pub fn new(base_url: &str, anon_key: &str, db: LocalDb, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            db,
            events,
            seq: Arc::new(AtomicU64::new(0)),
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn emit(&self, kind: AuthEventKind, user_id: Option<String>) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(seq, ?kind, "Auth session event");
        // No subscribers is fine.
        let _ = self.events.send(AuthEvent { seq, kind, user_id });
    }

    /// Bearer for table requests: the session's access token, else the anon key.
    async fn rest_bearer(&self) -> String {
        match self.db.get_tokens().await {
            Ok(Some(tokens)) => tokens.access_token,
            Ok(None) => self.anon_key.clone(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session tokens, using anon key");
                self.anon_key.clone()
            }
        }
    }

    /// Exchange a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<SessionTokens> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Token refresh request failed");
                AppError::network()
            })?;

        let token: TokenResponse = self.check_response_json(response).await?;
        Ok(token.into_tokens())
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<()> {
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::InvalidResponse(e.to_string()))
    }
}

/// Credential rejections become `Auth` errors with the provider's message.
fn into_auth_error(err: AppError) -> AppError {
    match err {
        AppError::Api { status, message } if (400..500).contains(&status) => AppError::Auth(message),
        other => other,
    }
}

/// Whether the provider rejected the token itself (as opposed to being unreachable).
fn is_token_rejection(err: &AppError) -> bool {
    matches!(err, AppError::Api { status, .. } if matches!(status, 400 | 401 | 403))
}

#[async_trait]
impl IdentityProvider for BaasClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<SessionTokens> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Sign-in request failed");
                AppError::network()
            })?;

        let token: TokenResponse = self
            .check_response_json(response)
            .await
            .map_err(into_auth_error)?;
        let tokens = token.into_tokens();

        self.db.set_tokens(&tokens).await?;
        self.emit(AuthEventKind::SignedIn, Some(tokens.user.id.clone()));
        tracing::info!(user_id = %tokens.user.id, "Identity sign-in successful");
        Ok(tokens)
    }

    async fn sign_up(&self, credentials: &SignUpCredentials) -> Result<SignUpOutcome> {
        let body = json!({
            "email": credentials.email,
            "password": credentials.password,
            "data": {
                "first_name": credentials.first_name,
                "last_name": credentials.last_name,
                "role": credentials.role,
                "phone": credentials.phone,
            }
        });

        let response = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Sign-up request failed");
                AppError::network()
            })?;

        let value: Value = self
            .check_response_json(response)
            .await
            .map_err(into_auth_error)?;

        // With email confirmation enabled the provider returns the bare user.
        if value.get("access_token").is_some() {
            let tokens = serde_json::from_value::<TokenResponse>(value)?.into_tokens();
            self.db.set_tokens(&tokens).await?;
            self.emit(AuthEventKind::SignedIn, Some(tokens.user.id.clone()));
            tracing::info!(user_id = %tokens.user.id, "Identity account created with session");
            return Ok(SignUpOutcome {
                user: tokens.user.clone(),
                session: Some(tokens),
            });
        }

        let user_value = value.get("user").cloned().unwrap_or(value);
        let user: IdentityUser = serde_json::from_value(user_value)?;
        tracing::info!(user_id = %user.id, "Identity account created, awaiting confirmation");
        Ok(SignUpOutcome {
            user,
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<()> {
        let tokens = match self.db.get_tokens().await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session tokens during sign-out");
                None
            }
        };

        let remote = match &tokens {
            Some(tokens) => match self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(&tokens.access_token)
                .send()
                .await
            {
                Ok(response) => self.check_response(response).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Sign-out request failed");
                    Err(AppError::network())
                }
            },
            None => Ok(()),
        };

        if let Err(e) = self.db.delete_tokens().await {
            tracing::warn!(error = %e, "Failed to delete session tokens");
        }
        self.emit(AuthEventKind::SignedOut, tokens.map(|t| t.user.id));
        remote
    }

    async fn get_session(&self) -> Result<Option<SessionTokens>> {
        let now = Utc::now().timestamp();
        let tokens = match self.db.get_tokens().await? {
            Some(tokens) => tokens,
            None => return Ok(None),
        };
        if !tokens.expires_within(now, TOKEN_REFRESH_MARGIN_SECS) {
            return Ok(Some(tokens));
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we were waiting.
        let tokens = match self.db.get_tokens().await? {
            Some(tokens) => tokens,
            None => return Ok(None),
        };
        if !tokens.expires_within(Utc::now().timestamp(), TOKEN_REFRESH_MARGIN_SECS) {
            return Ok(Some(tokens));
        }

        tracing::info!(user_id = %tokens.user.id, "Access token expiring, refreshing");
        match self.refresh_session(&tokens.refresh_token).await {
            Ok(refreshed) => {
                self.db.set_tokens(&refreshed).await?;
                self.emit(AuthEventKind::TokenRefreshed, Some(refreshed.user.id.clone()));
                Ok(Some(refreshed))
            }
            Err(e) if is_token_rejection(&e) => {
                tracing::info!(user_id = %tokens.user.id, error = %e, "Refresh token rejected, session ended");
                if let Err(e) = self.db.delete_tokens().await {
                    tracing::warn!(error = %e, "Failed to delete expired session tokens");
                }
                self.emit(AuthEventKind::SignedOut, Some(tokens.user.id));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_user(&self) -> Result<Option<IdentityUser>> {
        let tokens = match self.get_session().await? {
            Some(tokens) => tokens,
            None => return Ok(None),
        };

        let response = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Get-user request failed");
                AppError::network()
            })?;

        match self.check_response_json::<IdentityUser>(response).await {
            Ok(user) => Ok(Some(user)),
            Err(e) if is_token_rejection(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn last_event_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileRepository for BaasClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let url = format!(
            "{}/rest/v1/{}?id=eq.{}&select=*",
            self.base_url,
            USERS_TABLE,
            urlencoding::encode(user_id)
        );

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.rest_bearer().await)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Profile fetch failed");
                AppError::network()
            })?;

        let rows: Vec<UserProfile> = self.check_response_json(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile(&self, profile: &NewUserProfile) -> Result<UserProfile> {
        let url = format!("{}/rest/v1/{}", self.base_url, USERS_TABLE);

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.rest_bearer().await)
            .json(profile)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Profile insert failed");
                AppError::network()
            })?;

        let rows: Vec<UserProfile> = self.check_response_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::InvalidResponse("Profile insert returned no rows".to_string()))
    }
}
