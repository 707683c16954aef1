//! `format` keyword validators for the supported format set (spec §4.2).

use once_cell::sync::Lazy;
use regex::Regex;

/// The closed set of recognized `format` values. Anything outside this set
/// is a hard validation error (spec §4.2).
pub const SUPPORTED_FORMATS: &[&str] = &[
    "email", "uri", "url", "uuid", "date-time", "date", "time", "ipv4", "ipv6",
];

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex is valid")
});

/// Validate a string value against a known `format` name.
///
/// Returns `Ok(())` if the value matches, or `Err(message)` describing why
/// it does not. The caller is responsible for rejecting unrecognized
/// format names *before* calling this (see [`SUPPORTED_FORMATS`]).
pub fn validate_format(format: &str, value: &str) -> Result<(), String> {
    match format {
        "email" => {
            if EMAIL_RE.is_match(value) {
                Ok(())
            } else {
                Err(format!("`{value}` is not a valid email address"))
            }
        }
        "uri" | "url" => url::Url::parse(value)
            .map(|_| ())
            .map_err(|e| format!("`{value}` is not a valid {format}: {e}")),
        "uuid" => uuid::Uuid::parse_str(value)
            .map(|_| ())
            .map_err(|e| format!("`{value}` is not a valid uuid: {e}")),
        "date-time" => chrono::DateTime::parse_from_rfc3339(value)
            .map(|_| ())
            .map_err(|e| format!("`{value}` is not a valid date-time: {e}")),
        "date" => chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|e| format!("`{value}` is not a valid date: {e}")),
        "time" => chrono::NaiveTime::parse_from_str(value, "%H:%M:%S")
            .map(|_| ())
            .map_err(|e| format!("`{value}` is not a valid time: {e}")),
        "ipv4" => value
            .parse::<std::net::Ipv4Addr>()
            .map(|_| ())
            .map_err(|e| format!("`{value}` is not a valid ipv4 address: {e}")),
        "ipv6" => value
            .parse::<std::net::Ipv6Addr>()
            .map(|_| ())
            .map_err(|e| format!("`{value}` is not a valid ipv6 address: {e}")),
        other => Err(format!("unrecognized format `{other}`")),
    }
}
