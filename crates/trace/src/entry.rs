//! Sanitized trace records, appended one per HTTP attempt.

use axon_core::ErrorDetail;
use serde::{Deserialize, Serialize};

use crate::redact::{sanitize_body, sanitize_headers, sanitize_url};

/// The sanitized request half of a trace entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRequest {
    /// HTTP method.
    pub method: String,
    /// URL reduced to scheme+host+path (spec §4.9).
    pub url: String,
    /// Allow/deny-listed headers.
    pub headers: Vec<(String, String)>,
    /// Redacted, truncated request body, if any.
    pub body: Option<String>,
}

impl TraceRequest {
    /// Build a sanitized request record from raw attempt data.
    #[must_use]
    pub fn sanitize(method: &str, raw_url: &str, headers: &[(String, String)], body: Option<&str>) -> Self {
        Self {
            method: method.to_string(),
            url: sanitize_url(raw_url),
            headers: sanitize_headers(headers),
            body: body.map(sanitize_body),
        }
    }
}

/// The sanitized response half of a trace entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceResponse {
    /// HTTP status code.
    pub status: u16,
    /// Allow/deny-listed response headers.
    pub headers: Vec<(String, String)>,
    /// Redacted, truncated response body, if any.
    pub body: Option<String>,
}

impl TraceResponse {
    /// Build a sanitized response record from raw attempt data.
    #[must_use]
    pub fn sanitize(status: u16, headers: &[(String, String)], body: Option<&str>) -> Self {
        Self {
            status,
            headers: sanitize_headers(headers),
            body: body.map(sanitize_body),
        }
    }
}

/// One sanitized record of an HTTP attempt: the request always present,
/// the response present on completion, the error present on failure.
/// Exactly one of `response`/`error` is set once the attempt finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Attempt number, 1-based, matching `ErrorDetail`/retry bookkeeping.
    pub attempt: u32,
    /// Sanitized request.
    pub request: TraceRequest,
    /// Sanitized response, if the attempt received one.
    pub response: Option<TraceResponse>,
    /// Failure detail, if the attempt did not complete successfully.
    /// `context` on this error is expected to already be sanitized by the
    /// producing component (see `axon_trace::sanitize_error_context`).
    pub error: Option<ErrorDetail>,
}

impl TraceEntry {
    /// Construct a trace entry for a request that received a response.
    #[must_use]
    pub fn success(attempt: u32, request: TraceRequest, response: TraceResponse) -> Self {
        Self { attempt, request, response: Some(response), error: None }
    }

    /// Construct a trace entry for a request that failed before or during transport.
    #[must_use]
    pub fn failure(attempt: u32, request: TraceRequest, error: ErrorDetail) -> Self {
        Self { attempt, request, response: None, error: Some(error) }
    }
}
