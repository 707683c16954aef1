#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Maps raw transport and HTTP outcomes onto the closed [`ErrorCategory`]
//! taxonomy (component C5, spec §4.4).
//!
//! This is the single place that decides retryability from a status code
//! or a transport failure; every other component consumes its output
//! rather than re-deriving retry decisions from status codes itself.

use std::time::Duration;

use axon_core::{ErrorCategory, ErrorDetail};

/// The phase/cause of a transport-level failure, before any HTTP response
/// was produced (or while one was still being read).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailureKind {
    /// No response arrived before the connect/request timeout elapsed.
    TimeoutBeforeResponse,
    /// The timeout elapsed while streaming a response body that had
    /// already started arriving.
    TimeoutAfterResponseStarted,
    /// The OS or a firewall refused the TCP connection outright.
    ConnectionRefused,
    /// The hostname could not be resolved.
    DnsFailure,
    /// The TLS handshake failed (cert validation, protocol mismatch, etc).
    TlsHandshakeFailure,
}

/// Categorize a transport-level failure that occurred before a usable HTTP
/// response existed.
#[must_use]
pub fn categorize_network_failure(kind: NetworkFailureKind) -> ErrorDetail {
    let (category, message, subtype) = match kind {
        NetworkFailureKind::TimeoutBeforeResponse => {
            (ErrorCategory::NetworkTimeout, "request timed out waiting for a response", "timeout_before_response")
        }
        NetworkFailureKind::TimeoutAfterResponseStarted => {
            (ErrorCategory::NetworkTimeout, "request timed out while streaming the response body", "timeout_after_response")
        }
        NetworkFailureKind::ConnectionRefused => {
            (ErrorCategory::NetworkConnectionRefused, "connection refused", "connection_refused")
        }
        NetworkFailureKind::DnsFailure => {
            (ErrorCategory::NetworkConnectionRefused, "DNS resolution failed", "dns_failure")
        }
        NetworkFailureKind::TlsHandshakeFailure => {
            (ErrorCategory::NetworkConnectionRefused, "TLS handshake failed", "tls_handshake_failure")
        }
    };

    ErrorDetail::new(category, message, true).with_context("subtype", subtype)
}

/// Categorize a completed HTTP response by status code.
///
/// `retry_after` is the parsed `Retry-After` header value, if present;
/// it is only attached when the resulting category is retryable.
#[must_use]
pub fn categorize_http_status(status: u16, retry_after: Option<Duration>) -> ErrorDetail {
    let (category, message, retryable): (ErrorCategory, &str, bool) = match status {
        401 => (ErrorCategory::AuthInvalid, "credentials were rejected", false),
        403 => (ErrorCategory::AuthExpired, "credentials were valid but are no longer authorized", false),
        429 => (ErrorCategory::RateLimitBurst, "rate limited", true),
        503 => (ErrorCategory::ApiUnavailable, "the service is temporarily unavailable", true),
        501 | 505 => (ErrorCategory::ApiUnexpectedStatus, "the server does not support this request", false),
        500..=599 => (ErrorCategory::ApiUnexpectedStatus, "unexpected server error", true),
        400..=499 => (ErrorCategory::ValidationFailed, "the request was rejected by the server", false),
        _ => (ErrorCategory::ApiUnexpectedStatus, "unexpected HTTP status", false),
    };

    let mut detail = ErrorDetail::new(category, message, retryable)
        .with_status_code(status)
        .with_context("subtype", format!("http_{status}"));

    if retryable {
        if let Some(after) = retry_after {
            detail = detail.with_retry_after(after);
        }
    }

    detail
}

/// Categorize a response whose status implied success but whose body could
/// not be parsed as the declared content type (spec §4.4: "A successful
/// looking response body failed to parse").
#[must_use]
pub fn categorize_malformed_response(status: u16, parse_error: impl Into<String>) -> ErrorDetail {
    ErrorDetail::new(ErrorCategory::ApiResponseMalformed, parse_error.into(), false)
        .with_status_code(status)
        .with_context("subtype", "malformed_response_body")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_non_retryable_auth_invalid() {
        let err = categorize_http_status(401, None);
        assert_eq!(err.category, ErrorCategory::AuthInvalid);
        assert!(!err.retryable);
    }

    #[test]
    fn forbidden_is_auth_expired() {
        let err = categorize_http_status(403, None);
        assert_eq!(err.category, ErrorCategory::AuthExpired);
    }

    #[test]
    fn rate_limit_honors_retry_after() {
        let err = categorize_http_status(429, Some(Duration::from_secs(5)));
        assert_eq!(err.category, ErrorCategory::RateLimitBurst);
        assert!(err.retryable);
        assert_eq!(err.retry_after, Some(Duration::from_secs(5)));
    }

    #[test]
    fn service_unavailable_is_retryable() {
        let err = categorize_http_status(503, None);
        assert_eq!(err.category, ErrorCategory::ApiUnavailable);
        assert!(err.retryable);
    }

    #[test]
    fn not_found_and_gone_are_validation_failed() {
        assert_eq!(categorize_http_status(404, None).category, ErrorCategory::ValidationFailed);
        assert_eq!(categorize_http_status(410, None).category, ErrorCategory::ValidationFailed);
    }

    #[test]
    fn not_implemented_is_unexpected_status_non_retryable() {
        let err = categorize_http_status(501, None);
        assert_eq!(err.category, ErrorCategory::ApiUnexpectedStatus);
        assert!(!err.retryable);
    }

    #[test]
    fn http_version_not_supported_is_unexpected_and_terminal() {
        let err = categorize_http_status(505, None);
        assert_eq!(err.category, ErrorCategory::ApiUnexpectedStatus);
        assert!(!err.retryable);
    }

    #[test]
    fn other_5xx_is_retryable_unexpected_status() {
        let err = categorize_http_status(502, None);
        assert_eq!(err.category, ErrorCategory::ApiUnexpectedStatus);
        assert!(err.retryable);
    }

    #[test]
    fn other_4xx_is_non_retryable_validation_failed() {
        let err = categorize_http_status(422, None);
        assert_eq!(err.category, ErrorCategory::ValidationFailed);
        assert!(!err.retryable);
    }

    #[test]
    fn network_failures_are_retryable_with_subtype() {
        let err = categorize_network_failure(NetworkFailureKind::DnsFailure);
        assert_eq!(err.category, ErrorCategory::NetworkConnectionRefused);
        assert!(err.retryable);
        assert_eq!(err.context.get("subtype").and_then(|v| v.as_str()), Some("dns_failure"));
    }

    #[test]
    fn timeout_before_and_after_response_are_distinguished() {
        let before = categorize_network_failure(NetworkFailureKind::TimeoutBeforeResponse);
        let after = categorize_network_failure(NetworkFailureKind::TimeoutAfterResponseStarted);
        assert_eq!(before.category, ErrorCategory::NetworkTimeout);
        assert_eq!(after.category, ErrorCategory::NetworkTimeout);
        assert_ne!(before.context.get("subtype"), after.context.get("subtype"));
    }

    #[test]
    fn malformed_response_is_non_retryable() {
        let err = categorize_malformed_response(200, "unexpected token at offset 4");
        assert_eq!(err.category, ErrorCategory::ApiResponseMalformed);
        assert!(!err.retryable);
        assert_eq!(err.status_code, Some(200));
    }
}
