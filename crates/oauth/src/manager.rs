//! Token acquisition, caching and single-flight refresh coordination.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;

use axon_core::{ErrorCategory, ErrorDetail};

use crate::config::OAuthConfig;
use crate::error_map::{categorize_oauth_error, TokenErrorResponse};
use crate::token::OAuthTokenRecord;

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

#[derive(Debug, serde::Deserialize)]
struct TokenSuccessResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Caches OAuth2 client-credentials tokens and coordinates refreshes so
/// concurrent callers for the same `client_id` share one in-flight request
/// instead of each hitting the token endpoint.
pub struct TokenManager {
    http: reqwest::Client,
    cache: DashMap<String, OAuthTokenRecord>,
    locks: DashMap<String, Arc<AsyncMutex<()>>>,
}

impl Default for TokenManager {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl TokenManager {
    /// Build a manager around an existing HTTP client (so callers can share
    /// connection pools / TLS config with the rest of the system).
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http, cache: DashMap::new(), locks: DashMap::new() }
    }

    /// Get a valid access token for `config`, refreshing if necessary.
    pub async fn get_token(&self, config: &OAuthConfig) -> Result<String, ErrorDetail> {
        if let Some(fresh) = self.fresh_cached_token(config) {
            return Ok(fresh);
        }

        let lock = self
            .locks
            .entry(config.client_id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-check: another task may have refreshed while we waited for the lock.
        if let Some(fresh) = self.fresh_cached_token(config) {
            return Ok(fresh);
        }

        if let Some(entry) = self.cache.get(&config.client_id) {
            if entry.age() < config.min_refresh_interval {
                tracing::debug!(
                    client_id = %config.client_id,
                    "refresh requested within min_refresh_interval, refusing to hammer the token endpoint"
                );
                return Err(ErrorDetail::new(
                    ErrorCategory::TokenRefreshRateLimited,
                    "refresh requested within min_refresh_interval of the last one",
                    true,
                )
                .with_context("subtype", "oauth_refresh_rate_limited"));
            }
        }

        let current_refresh_token =
            self.cache.get(&config.client_id).and_then(|e| e.refresh_token.clone()).unwrap_or_else(|| config.refresh_token.clone());

        let record = self.fetch_token(config, &current_refresh_token).await?;
        let access_token = record.access_token.clone();
        self.cache.insert(config.client_id.clone(), record);
        Ok(access_token)
    }

    fn fresh_cached_token(&self, config: &OAuthConfig) -> Option<String> {
        let entry = self.cache.get(&config.client_id)?;
        if entry.needs_refresh(config.refresh_buffer) {
            None
        } else {
            Some(entry.access_token.clone())
        }
    }

    async fn fetch_token(&self, config: &OAuthConfig, refresh_token: &str) -> Result<OAuthTokenRecord, ErrorDetail> {
        let request = TokenRequest {
            grant_type: "refresh_token",
            client_id: &config.client_id,
            client_secret: &config.client_secret,
            scope: config.scope.as_deref(),
            refresh_token: Some(refresh_token),
        };

        let response = self
            .http
            .post(&config.token_url)
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                ErrorDetail::new(ErrorCategory::NetworkTimeout, format!("OAuth token request failed: {e}"), true)
                    .with_context("subtype", "oauth_token_request_failed")
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            ErrorDetail::new(ErrorCategory::ApiResponseMalformed, format!("failed to read token response body: {e}"), false)
        })?;

        if !(200..300).contains(&status) {
            let error_body: TokenErrorResponse = serde_json::from_str(&body).unwrap_or_else(|_| TokenErrorResponse {
                error: "unknown_error".to_string(),
                error_description: Some(body.clone()),
            });
            return Err(categorize_oauth_error(status, &error_body));
        }

        let parsed: TokenSuccessResponse = serde_json::from_str(&body).map_err(|e| {
            ErrorDetail::new(ErrorCategory::InvalidResponse, format!("token response was not valid JSON: {e}"), true)
                .with_status_code(status)
        })?;

        // The IdP may rotate the refresh token on every use, or reuse the
        // same one indefinitely — keep whichever it sent back, falling back
        // to the one we just presented if it sent none (spec §4.6 step 6).
        let rotated_refresh_token = parsed.refresh_token.or_else(|| Some(refresh_token.to_string()));

        Ok(OAuthTokenRecord::new(
            parsed.access_token,
            rotated_refresh_token,
            std::time::Duration::from_secs(parsed.expires_in),
            config.clock_skew,
        ))
    }
}
