//! Wire-level request/response shapes, independent of any orchestrator data model.

/// A fully-resolved outbound HTTP call: method, URL, headers and body are
/// already substituted and validated by the time this reaches the engine.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// HTTP method, e.g. `"POST"`.
    pub method: String,
    /// Absolute request URL.
    pub url: String,
    /// Request headers, including any authentication headers already applied.
    pub headers: Vec<(String, String)>,
    /// Raw request body, if any.
    pub body: Option<Vec<u8>>,
}

/// A received HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status code indicates success (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse a `Retry-After` header as a whole number of seconds. HTTP-date
    /// values are not supported; unparseable headers are treated as absent.
    #[must_use]
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("retry-after"))
            .and_then(|(_, value)| value.trim().parse::<u64>().ok())
            .map(std::time::Duration::from_secs)
    }
}
