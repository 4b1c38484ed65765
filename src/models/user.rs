// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User, profile and identity-session models.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account role. Fixed when the profile is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub enum Role {
    Customer,
    Stylist,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Customer => f.write_str("customer"),
            Role::Stylist => f.write_str("stylist"),
        }
    }
}

/// Row of the BaaS `users` profile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity-provider user ID (also the row key)
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Insert shape for a new profile row.
#[derive(Debug, Clone, Serialize)]
pub struct NewUserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Bare identity-provider user (no application profile).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
}

/// Identity-provider session: token pair plus the user it belongs to.
///
/// Persisted only by the identity provider's storage adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry (unix seconds)
    pub expires_at: i64,
    pub user: IdentityUser,
}

impl SessionTokens {
    /// Whether the access token expires within `margin_secs` of `now`.
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        now + margin_secs >= self.expires_at
    }
}

/// The signed-in principal, as exposed to the rest of the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct AuthenticatedUser {
    pub id: String,
    /// "First Last"
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub is_email_verified: bool,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Provider session backing this user; never written to the user snapshot.
    #[serde(skip)]
    #[cfg_attr(feature = "binding-generation", ts(skip))]
    pub session: Option<SessionTokens>,
}

impl AuthenticatedUser {
    /// Build the user snapshot from a profile row.
    pub fn from_profile(profile: UserProfile, session: Option<SessionTokens>) -> Self {
        let name = format!("{} {}", profile.first_name, profile.last_name)
            .trim()
            .to_string();
        Self {
            id: profile.id,
            name,
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            role: profile.role,
            is_email_verified: profile.is_email_verified,
            avatar: profile.avatar,
            session,
        }
    }
}

/// Sign-up form input.
#[derive(Debug, Clone, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub last_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
}
