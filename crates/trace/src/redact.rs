//! Redaction primitives: URLs, headers, bodies, and error contexts.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

const MASK: &str = "[REDACTED]";
const BODY_LIMIT_BYTES: usize = 1024;
const BODY_TRUNCATION_MARKER: &str = "...[truncated]";
const HEADER_VALUE_LIMIT: usize = 100;
const ERROR_CONTEXT_FIELD_LIMIT: usize = 100;

/// Headers that are always safe to log verbatim (case-insensitive).
const HEADER_ALLOW_LIST: &[&str] = &[
    "content-type",
    "accept",
    "user-agent",
    "content-length",
    "host",
    "connection",
    "cache-control",
];

/// Header name suffix/substring patterns that must be masked (case-insensitive).
/// `exact` entries match the whole header name; `contains` entries match any
/// substring, covering the `*-api-key`, `*-auth-*`, `*-token`, `*-secret`,
/// `*key*`, `*token*`, `*secret*` glob patterns from spec §4.9.
const HEADER_DENY_EXACT: &[&str] = &["authorization", "cookie"];
const HEADER_DENY_CONTAINS: &[&str] = &["api-key", "auth-", "token", "secret", "key"];

/// Error context fields retained when filtering an error body for context
/// (spec §4.9: "further filtered to a 4-field allow-list").
const ERROR_CONTEXT_ALLOW_LIST: &[&str] = &["error", "error_code", "error_type", "status", "code"];

static CREDENTIAL_JSON_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)"(password|api_key|token|secret|auth|session|[a-z0-9_]*_key|[a-z0-9_]*_token|[a-z0-9_]*_secret)"\s*:\s*"[^"]*""#,
    )
    .expect("static regex is valid")
});
static BEARER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Bearer\s+[A-Za-z0-9\-._~+/]+=*").expect("static regex is valid"));
static BASIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Basic\s+[A-Za-z0-9+/]+=*").expect("static regex is valid"));
static URL_ENCODED_CREDENTIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|api_key|token|secret|auth|session|[a-z0-9_]*_key|[a-z0-9_]*_token|[a-z0-9_]*_secret)=[^&\s]*")
        .expect("static regex is valid")
});

/// Reduce a URL to `scheme://host/path`, dropping query and fragment.
///
/// Returns `"[invalid-url]"` if `raw` does not parse as a URL.
#[must_use]
pub fn sanitize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => {
            let host = url.host_str().unwrap_or("");
            let port = url
                .port()
                .map(|p| format!(":{p}"))
                .unwrap_or_default();
            format!("{}://{}{}{}", url.scheme(), host, port, url.path())
        }
        Err(_) => "[invalid-url]".to_string(),
    }
}

fn is_denied_header(name_lower: &str) -> bool {
    HEADER_DENY_EXACT.contains(&name_lower) || HEADER_DENY_CONTAINS.iter().any(|p| name_lower.contains(p))
}

/// Filter and mask a header list per spec §4.9.
///
/// - Allow-listed headers pass through unchanged.
/// - Deny-listed headers are replaced with `[REDACTED]`.
/// - Any other header passes through, truncated to 100 chars.
#[must_use]
pub fn sanitize_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let lower = name.to_ascii_lowercase();
            let sanitized_value = if HEADER_ALLOW_LIST.contains(&lower.as_str()) {
                value.clone()
            } else if is_denied_header(&lower) {
                MASK.to_string()
            } else {
                truncate_chars(value, HEADER_VALUE_LIMIT)
            };
            (name.clone(), sanitized_value)
        })
        .collect()
}

/// Redact credential-shaped substrings from a body, then truncate to 1 KiB.
#[must_use]
pub fn sanitize_body(body: &str) -> String {
    let redacted = CREDENTIAL_JSON_KEY.replace_all(body, |caps: &regex::Captures<'_>| {
        format!("\"{}\":\"{MASK}\"", &caps[1])
    });
    let redacted = BEARER_TOKEN.replace_all(&redacted, format!("Bearer {MASK}"));
    let redacted = BASIC_TOKEN.replace_all(&redacted, format!("Basic {MASK}"));
    let redacted = URL_ENCODED_CREDENTIAL.replace_all(&redacted, |caps: &regex::Captures<'_>| {
        format!("{}={MASK}", &caps[1])
    });

    truncate_bytes(&redacted, BODY_LIMIT_BYTES)
}

/// Filter an error response body/context down to a 4-field allow-list,
/// each value capped at 100 characters (spec §4.9).
#[must_use]
pub fn sanitize_error_context(value: &serde_json::Value) -> serde_json::Value {
    let serde_json::Value::Object(map) = value else {
        return serde_json::Value::Null;
    };
    let mut out = serde_json::Map::new();
    for key in ERROR_CONTEXT_ALLOW_LIST {
        if let Some(v) = map.get(*key) {
            let capped = match v {
                serde_json::Value::String(s) => serde_json::Value::String(truncate_chars(s, ERROR_CONTEXT_FIELD_LIMIT)),
                other => other.clone(),
            };
            out.insert((*key).to_string(), capped);
        }
    }
    serde_json::Value::Object(out)
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

/// Truncate `s` to at most `max_bytes`, with the truncation marker counted
/// against that budget rather than appended on top of it. Reserving the
/// marker's own space this way keeps the function idempotent: a string this
/// produces is always `<= max_bytes` long, so feeding its own output back in
/// takes the early return and comes back unchanged — required by spec §8's
/// `sanitize(sanitize(x)) == sanitize(x)`.
fn truncate_bytes(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let budget = max_bytes.saturating_sub(BODY_TRUNCATION_MARKER.len());
    let mut end = budget;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{BODY_TRUNCATION_MARKER}", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn url_drops_query_and_fragment() {
        assert_eq!(
            sanitize_url("https://api.example.com/v1/users?token=abc&x=1#frag"),
            "https://api.example.com/v1/users"
        );
    }

    #[test]
    fn invalid_url_yields_placeholder() {
        assert_eq!(sanitize_url("not a url"), "[invalid-url]");
    }

    #[test]
    fn url_with_explicit_port_is_kept() {
        assert_eq!(
            sanitize_url("http://localhost:8080/health?verbose=1"),
            "http://localhost:8080/health"
        );
    }

    #[test]
    fn allow_listed_headers_pass_through() {
        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        let out = sanitize_headers(&headers);
        assert_eq!(out[0].1, "application/json");
    }

    #[test]
    fn authorization_header_is_masked() {
        let headers = vec![("Authorization".to_string(), "Bearer sk-live-12345".to_string())];
        let out = sanitize_headers(&headers);
        assert_eq!(out[0].1, "[REDACTED]");
    }

    #[test]
    fn glob_style_key_patterns_are_masked() {
        for name in ["X-Api-Key", "X-Auth-Token", "Client-Secret", "Cookie"] {
            let headers = vec![(name.to_string(), "sensitive-value".to_string())];
            let out = sanitize_headers(&headers);
            assert_eq!(out[0].1, "[REDACTED]", "header {name} should be masked");
        }
    }

    #[test]
    fn unknown_header_is_truncated_not_masked() {
        let long_value = "x".repeat(200);
        let headers = vec![("X-Trace-Id".to_string(), long_value.clone())];
        let out = sanitize_headers(&headers);
        assert_eq!(out[0].1.len(), HEADER_VALUE_LIMIT);
        assert_ne!(out[0].1, long_value);
    }

    #[test]
    fn body_redacts_json_credential_keys() {
        let body = r#"{"password":"hunter2","api_key":"sk-123","name":"ok"}"#;
        let sanitized = sanitize_body(body);
        assert!(!sanitized.contains("hunter2"));
        assert!(!sanitized.contains("sk-123"));
        assert!(sanitized.contains("\"name\":\"ok\""));
    }

    #[test]
    fn body_redacts_bearer_and_basic_auth() {
        let body = "Authorization: Bearer abcDEF123.xyz";
        let sanitized = sanitize_body(body);
        assert!(!sanitized.contains("abcDEF123"));
        assert!(sanitized.contains(&format!("Bearer {MASK}")));
    }

    #[test]
    fn body_redacts_url_encoded_credentials() {
        let body = "grant_type=refresh_token&refresh_token=abc123&client_id=xyz";
        let sanitized = sanitize_body(body);
        assert!(!sanitized.contains("abc123"));
    }

    #[test]
    fn body_is_truncated_with_marker() {
        let body = "a".repeat(2000);
        let sanitized = sanitize_body(&body);
        assert!(sanitized.len() <= BODY_LIMIT_BYTES);
        assert!(sanitized.ends_with(BODY_TRUNCATION_MARKER));
    }

    #[test]
    fn truncation_is_idempotent_on_an_already_truncated_body() {
        let body = "a".repeat(2000);
        let once = sanitize_body(&body);
        let twice = sanitize_body(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn error_context_keeps_only_allow_listed_fields() {
        let body = serde_json::json!({
            "error": "invalid_grant",
            "error_description": "should be dropped",
            "status": 400,
            "internal_trace_id": "should be dropped too",
        });
        let sanitized = sanitize_error_context(&body);
        assert_eq!(sanitized["error"], "invalid_grant");
        assert_eq!(sanitized["status"], 400);
        assert!(sanitized.get("error_description").is_none());
        assert!(sanitized.get("internal_trace_id").is_none());
    }

    #[test]
    fn error_context_caps_string_fields() {
        let long = "e".repeat(500);
        let body = serde_json::json!({ "error": long });
        let sanitized = sanitize_error_context(&body);
        assert_eq!(sanitized["error"].as_str().unwrap().len(), ERROR_CONTEXT_FIELD_LIMIT);
    }
}
