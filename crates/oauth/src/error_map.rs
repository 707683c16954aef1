//! Maps RFC 6749 §5.2 error codes onto the shared [`ErrorCategory`] taxonomy.

use axon_core::{ErrorCategory, ErrorDetail};

/// The subset of the token error response body this client understands.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TokenErrorResponse {
    /// RFC 6749 `error` code.
    pub error: String,
    /// Optional human-readable detail from the identity provider.
    pub error_description: Option<String>,
}

/// Translate an OAuth2 token-endpoint error response into an [`ErrorDetail`].
#[must_use]
pub fn categorize_oauth_error(status: u16, body: &TokenErrorResponse) -> ErrorDetail {
    let (category, retryable) = match body.error.as_str() {
        "invalid_client" | "invalid_grant" | "unauthorized_client" => (ErrorCategory::AuthInvalid, false),
        "invalid_scope" | "unsupported_grant_type" | "invalid_request" => (ErrorCategory::ValidationFailed, false),
        "server_error" | "temporarily_unavailable" => (ErrorCategory::ApiUnavailable, true),
        _ => (ErrorCategory::ApiUnexpectedStatus, false),
    };

    let message = body.error_description.clone().unwrap_or_else(|| body.error.clone());

    let mut detail = ErrorDetail::new(category, message, retryable)
        .with_status_code(status)
        .with_code(body.error.clone())
        .with_context("subtype", "oauth_token_error");

    // `invalid_grant` means the stored refresh token itself is dead — the
    // caller must route the user through a fresh authorization flow, unlike
    // `invalid_client`/`unauthorized_client`, which indicate a credentials
    // misconfiguration instead (spec §7).
    if body.error == "invalid_grant" {
        detail = detail.with_context("requiresReauth", true);
    }

    detail
}
