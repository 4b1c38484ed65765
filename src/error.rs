// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error type and the uniform `{success, data, error}` envelope.
//!
//! Every public operation in the crate returns [`Result`]. Callers that need
//! the JSON envelope shape (the UI bridge, the probe binary) convert with
//! `Envelope::from(result)`.

use serde::Serialize;

use crate::models::{Pagination, Role};

/// Application error type shared by the auth layer and the data services.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Non-2xx response from the REST API or the BaaS.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("{0}")]
    Network(String),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Identity provider rejected the operation (bad credentials, duplicate account, ...).
    #[error("{0}")]
    Auth(String),

    #[error("This account is registered as a {actual}. Please sign in as a {actual} instead of a {expected}.")]
    RoleMismatch { expected: Role, actual: Role },

    #[error("No profile found for user {0}")]
    ProfileNotFound(String),

    #[error("Your account was created but the profile could not be saved: {0}")]
    ProfileCreation(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Local storage error: {0}")]
    Storage(String),

    #[error("Location unavailable: {0}")]
    Location(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Fixed message for transport-level failures.
    pub const NETWORK_ERROR: &'static str =
        "Network error. Please check your connection and try again.";

    /// Fallback when an error response carries no message.
    pub const GENERIC_ERROR: &'static str = "Something went wrong. Please try again.";

    /// Build the network error with its fixed message.
    pub fn network() -> Self {
        AppError::Network(Self::NETWORK_ERROR.to_string())
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network_error(&self) -> bool {
        matches!(self, AppError::Network(_))
    }

    /// Whether the server rejected our credentials or token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized)
            || matches!(self, AppError::Api { status, .. } if *status == 401)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let detail = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                if field == "__all__" {
                    detail
                } else {
                    format!("{} {}", field, detail)
                }
            })
            .collect();
        fields.sort();
        AppError::Validation(fields.join(", "))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidResponse(err.to_string())
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;

/// Uniform response envelope.
///
/// `error` is always present when `success` is false.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            pagination: None,
        }
    }

    pub fn err(error: &AppError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            message: None,
            pagination: None,
        }
    }
}

impl<T> From<Result<T>> for Envelope<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Envelope::ok(data),
            Err(e) => Envelope::err(&e),
        }
    }
}

impl<T> Envelope<T> {
    /// Envelope for a normalized API response, keeping its message and pagination.
    pub fn from_response(result: Result<crate::services::api::ApiResponse<T>>) -> Self {
        match result {
            Ok(response) => Envelope {
                success: true,
                data: Some(response.data),
                error: None,
                message: response.message,
                pagination: response.pagination,
            },
            Err(e) => Envelope::err(&e),
        }
    }
}
