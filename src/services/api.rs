// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! REST API client for the booking/search domain.
//!
//! Handles:
//! - Bearer token attachment from local token storage
//! - Response normalization (bare payload or `{data, message, pagination}`)
//! - Error mapping: HTTP errors carry the server's message, transport
//!   failures a fixed network error

use std::time::Duration;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::db::LocalDb;
use crate::error::{AppError, Result};
use crate::models::Pagination;

/// Normalized successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> T {
        self.data
    }
}

/// REST API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    db: LocalDb,
}

impl ApiClient {
    /// Create a client for `base_url`, reading tokens from `db`.
    pub fn new(base_url: &str, db: LocalDb, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            db,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Issue a request with an optional JSON body.
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut builder = self.http.request(method.clone(), self.url(endpoint));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(&method, endpoint, builder).await
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<ApiResponse<T>> {
        self.request::<T, ()>(Method::GET, endpoint, None).await
    }

    /// GET with query-string parameters.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>> {
        let builder = self.http.get(self.url(endpoint)).query(query);
        self.execute(&Method::GET, endpoint, builder).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    pub async fn patch<T, B>(&self, endpoint: &str, body: &B) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, endpoint, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<ApiResponse<T>> {
        self.request::<T, ()>(Method::DELETE, endpoint, None).await
    }

    /// Attach auth, send, and normalize.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: &Method,
        endpoint: &str,
        mut builder: reqwest::RequestBuilder,
    ) -> Result<ApiResponse<T>> {
        match self.db.get_tokens().await {
            Ok(Some(tokens)) => builder = builder.bearer_auth(&tokens.access_token),
            Ok(None) => {}
            Err(e) => {
                // Unauthenticated requests still go out; the server decides.
                tracing::warn!(error = %e, "Failed to read auth tokens, sending without bearer");
            }
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(%method, endpoint, error = %e, "API request failed");
            AppError::network()
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::warn!(%method, endpoint, error = %e, "Failed to read API response body");
            AppError::network()
        })?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::debug!(%method, endpoint, status = status.as_u16(), %message, "API error response");
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        normalize(&body)
    }
}

/// Pull a human-readable message out of an error body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error_description", "msg", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| AppError::GENERIC_ERROR.to_string())
}

/// Unwrap `{data, message, pagination}` or take the body as the payload.
fn normalize<T: DeserializeOwned>(body: &str) -> Result<ApiResponse<T>> {
    let value: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body)?
    };

    let (payload, message, pagination) = match value {
        Value::Object(mut map) if map.contains_key("data") => {
            let payload = map.remove("data").unwrap_or(Value::Null);
            let message = map
                .remove("message")
                .and_then(|m| m.as_str().map(str::to_string));
            let pagination = match map.remove("pagination") {
                Some(Value::Null) | None => None,
                Some(p) => Some(serde_json::from_value(p)?),
            };
            (payload, message, pagination)
        }
        other => (other, None, None),
    };

    Ok(ApiResponse {
        data: serde_json::from_value(payload)?,
        message,
        pagination,
    })
}
