//! The closed error taxonomy shared by every component.
//!
//! `ErrorCategory` is the control-flow currency: only `category` and
//! `retryable` drive retry/circuit-breaker/orchestrator decisions.
//! Everything else on [`ErrorDetail`] is diagnostic and must be sanitized
//! (via `axon-trace`) before it leaves the process boundary.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Closed set of failure categories (spec §4.4, extended with the
/// storage-specific categories produced in phase P8, spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCategory {
    /// HTTP 401 or equivalent: credentials are invalid.
    AuthInvalid,
    /// HTTP 403 or equivalent: credentials expired / were revoked.
    AuthExpired,
    /// HTTP 429: short-window rate limit.
    RateLimitBurst,
    /// Vendor-reported daily/long-window rate limit (catalog-driven).
    RateLimitDaily,
    /// Connect or read timeout.
    NetworkTimeout,
    /// TCP connection refused, DNS failure, or TLS handshake failure.
    NetworkConnectionRefused,
    /// A successful-looking response body failed to parse.
    ApiResponseMalformed,
    /// Catalog-declared override for a status a vendor treats as "this
    /// endpoint no longer exists" (spec §4.4's closed set; never produced by
    /// the built-in status table, only by `ApiCatalogEntry.errorMappings`).
    ApiEndpointRemoved,
    /// Any HTTP status this categorizer does not have a dedicated mapping for.
    ApiUnexpectedStatus,
    /// HTTP 503, or the circuit breaker is open for the target host.
    ApiUnavailable,
    /// Input or output failed schema validation, or another 4xx-class rejection.
    ValidationFailed,
    /// An invariant was violated in a way that indicates a bug, not a
    /// transient condition (storage quota, disk full, unknown exception).
    StateInconsistent,
    /// The caller cancelled the execution.
    UserCancelled,
    /// Storage connectivity is transiently unavailable.
    NetworkError,
    /// Storage-side throttling.
    RateLimited,
    /// Storage ACL / permission failure.
    Unauthorized,
    /// OAuth2 refresh attempted again within the minimum refresh interval.
    TokenRefreshRateLimited,
    /// An OAuth2 token response could not be parsed as JSON.
    InvalidResponse,
}

impl ErrorCategory {
    /// The category's stable wire name, as used in `context.errorSubtype`-free
    /// serialization and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthInvalid => "auth_invalid",
            Self::AuthExpired => "auth_expired",
            Self::RateLimitBurst => "rate_limit_burst",
            Self::RateLimitDaily => "rate_limit_daily",
            Self::NetworkTimeout => "network_timeout",
            Self::NetworkConnectionRefused => "network_connection_refused",
            Self::ApiResponseMalformed => "api_response_malformed",
            Self::ApiEndpointRemoved => "api_endpoint_removed",
            Self::ApiUnexpectedStatus => "api_unexpected_status",
            Self::ApiUnavailable => "api_unavailable",
            Self::ValidationFailed => "validation_failed",
            Self::StateInconsistent => "state_inconsistent",
            Self::UserCancelled => "user_cancelled",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::TokenRefreshRateLimited => "token_refresh_rate_limited",
            Self::InvalidResponse => "invalid_response",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured, diagnostic failure record.
///
/// Only `category` and `retryable` are read by control flow; `message`,
/// `code`, `status_code`, `retry_after`, `context`, and `suggestion` are
/// for humans and must be sanitized before logging or persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Closed failure category.
    pub category: ErrorCategory,
    /// Short human-readable message.
    pub message: String,
    /// Vendor- or protocol-specific error code, if any.
    pub code: Option<String>,
    /// HTTP status code, if the failure occurred at the HTTP layer.
    pub status_code: Option<u16>,
    /// Whether the orchestrator/retry controller should consider retrying.
    pub retryable: bool,
    /// Suggested delay before retrying (from `Retry-After` or a category default).
    #[serde(default, with = "crate::duration_millis_opt")]
    pub retry_after: Option<Duration>,
    /// Structured, sanitized diagnostic context (host, failure rate, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    /// Actionable suggestion for the caller.
    pub suggestion: Option<String>,
}

impl ErrorDetail {
    /// Build a minimal error detail for the given category.
    pub fn new(category: ErrorCategory, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            category,
            message: message.into(),
            code: None,
            status_code: None,
            retryable,
            retry_after: None,
            context: BTreeMap::new(),
            suggestion: None,
        }
    }

    /// Convenience constructor for `validation_failed`, always non-retryable.
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ValidationFailed, message, false)
    }

    /// Convenience constructor for `state_inconsistent`, the catch-all for
    /// unmapped exceptions (spec §7: "never hidden").
    pub fn state_inconsistent(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::StateInconsistent, message, false)
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach a single context key/value pair.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attach a `retryAfter` hint.
    #[must_use]
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Attach an HTTP status code.
    #[must_use]
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Attach a vendor/protocol error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.category, self.retryable, self.message)
    }
}

impl std::error::Error for ErrorDetail {}
