//! Single-attempt HTTP execution (component C7, spec §4.5).
//!
//! The engine never retries and never consults the circuit breaker — it
//! only knows how to make one call, enforce the response size cap, and
//! produce a sanitized [`TraceEntry`] regardless of outcome. [`crate::retry`]
//! is what loops.

use std::time::Duration;

use futures::StreamExt;

use axon_categorizer::{categorize_network_failure, NetworkFailureKind};
use axon_core::{ErrorCategory, ErrorDetail};
use axon_trace::TraceEntry;

use crate::request::{HttpResponse, OutboundRequest};

/// Tuning knobs for the HTTP engine.
#[derive(Debug, Clone)]
pub struct HttpEngineConfig {
    /// Hard cap on response body size; exceeding it aborts the read.
    pub max_response_bytes: usize,
    /// Time budget for receiving the initial response (headers).
    pub response_timeout: Duration,
    /// Time budget for reading the full response body once it starts.
    pub body_read_timeout: Duration,
}

impl Default for HttpEngineConfig {
    fn default() -> Self {
        Self {
            max_response_bytes: 10 * 1024 * 1024,
            response_timeout: Duration::from_secs(30),
            body_read_timeout: Duration::from_secs(60),
        }
    }
}

/// Executes one HTTP attempt and reports a sanitized trace of it.
pub struct HttpEngine {
    http: reqwest::Client,
    config: HttpEngineConfig,
}

impl HttpEngine {
    /// Build an engine around a shared client (so connection pooling and TLS
    /// configuration are shared with the rest of the process).
    #[must_use]
    pub fn new(http: reqwest::Client, config: HttpEngineConfig) -> Self {
        Self { http, config }
    }

    /// Execute `request` once. `attempt` is 1-indexed and only used for the trace.
    pub async fn execute_once(&self, request: &OutboundRequest, attempt: u32) -> (Result<HttpResponse, ErrorDetail>, TraceEntry) {
        let body_str = request.body.as_deref().map(|b| String::from_utf8_lossy(b).into_owned());
        let trace_request =
            axon_trace::TraceRequest::sanitize(&request.method, &request.url, &request.headers, body_str.as_deref());

        let method = match http::Method::from_bytes(request.method.as_bytes()) {
            Ok(m) => m,
            Err(_) => {
                let error = ErrorDetail::validation_failed(format!("invalid HTTP method `{}`", request.method));
                return (Err(error.clone()), TraceEntry::failure(attempt, trace_request, error));
            }
        };

        let mut builder = self.http.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let send_result = tokio::time::timeout(self.config.response_timeout, builder.send()).await;

        let response = match send_result {
            Err(_elapsed) => {
                let error = categorize_network_failure(NetworkFailureKind::TimeoutBeforeResponse);
                return (Err(error.clone()), TraceEntry::failure(attempt, trace_request, error));
            }
            Ok(Err(e)) => {
                let error = categorize_network_failure(classify_send_error(&e));
                return (Err(error.clone()), TraceEntry::failure(attempt, trace_request, error));
            }
            Ok(Ok(response)) => response,
        };

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or("").to_string()))
            .collect();

        if let Some(declared_len) = response.content_length() {
            if declared_len as usize > self.config.max_response_bytes {
                let error = response_too_large_error(status);
                return (Err(error.clone()), TraceEntry::failure(attempt, trace_request, error));
            }
        }

        let body = match self.read_body_capped(response).await {
            Ok(bytes) => bytes,
            Err(()) => {
                let error = response_too_large_error(status);
                return (Err(error.clone()), TraceEntry::failure(attempt, trace_request, error));
            }
        };

        let body_string = String::from_utf8_lossy(&body).into_owned();
        let trace_response = axon_trace::TraceResponse::sanitize(status, &headers, Some(&body_string));
        let trace_entry = TraceEntry::success(attempt, trace_request, trace_response);

        (Ok(HttpResponse { status, headers, body }), trace_entry)
    }

    async fn read_body_capped(&self, response: reqwest::Response) -> Result<Vec<u8>, ()> {
        let mut buffer = Vec::new();
        let mut stream = response.bytes_stream();
        let read = tokio::time::timeout(self.config.body_read_timeout, async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|_| ())?;
                if buffer.len() + chunk.len() > self.config.max_response_bytes {
                    return Err(());
                }
                buffer.extend_from_slice(&chunk);
            }
            Ok(())
        })
        .await;

        match read {
            Ok(Ok(())) => Ok(buffer),
            Ok(Err(())) => Err(()),
            Err(_elapsed) => Err(()),
        }
    }
}

fn response_too_large_error(status: u16) -> ErrorDetail {
    ErrorDetail::new(ErrorCategory::ApiResponseMalformed, "response exceeds the maximum allowed size", false)
        .with_status_code(status)
        .with_context("subtype", "response_too_large")
}

/// Best-effort classification of a `reqwest::Error` into a transport failure
/// kind. `reqwest` does not expose a structured DNS/TLS distinction, so this
/// falls back to matching the error's display text; anything unrecognized
/// defaults to a plain connection refusal.
fn classify_send_error(error: &reqwest::Error) -> NetworkFailureKind {
    if error.is_timeout() {
        return NetworkFailureKind::TimeoutBeforeResponse;
    }
    if error.is_connect() {
        let text = error.to_string().to_ascii_lowercase();
        if text.contains("dns") || text.contains("resolve") || text.contains("lookup") {
            return NetworkFailureKind::DnsFailure;
        }
        if text.contains("tls") || text.contains("ssl") || text.contains("certificate") {
            return NetworkFailureKind::TlsHandshakeFailure;
        }
        return NetworkFailureKind::ConnectionRefused;
    }
    NetworkFailureKind::ConnectionRefused
}
