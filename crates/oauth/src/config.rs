//! OAuth2 refresh-token configuration (spec §4.6).

use std::time::Duration;

/// Everything needed to mint and refresh one client's access token.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Token endpoint URL.
    pub token_url: String,
    /// OAuth2 `client_id`.
    pub client_id: String,
    /// OAuth2 `client_secret`.
    pub client_secret: String,
    /// The refresh token to present on the first request. Superseded in the
    /// cache by whatever the IdP returns on a later rotation, if anything.
    pub refresh_token: String,
    /// Optional space-delimited scope string. Omitted from the request body
    /// entirely when empty, rather than sent as `scope=`.
    pub scope: Option<String>,
    /// Refresh a token this long before its reported expiry.
    pub refresh_buffer: Duration,
    /// Minimum time between two refreshes for the same client id, to avoid
    /// hammering the token endpoint when a token is already near-expiry and
    /// many concurrent actions ask for it at once.
    pub min_refresh_interval: Duration,
    /// Subtracted from the reported `expires_in` once, at storage time, to
    /// absorb clock skew between this process and the identity provider.
    /// This does not stack with `refresh_buffer` — the buffer check compares
    /// against the already-skew-adjusted expiry.
    pub clock_skew: Duration,
}

impl OAuthConfig {
    /// Defaults per spec §4.6: 5 minute refresh buffer, 10 second minimum
    /// refresh interval, 60 second clock skew allowance.
    #[must_use]
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            scope: None,
            refresh_buffer: Duration::from_secs(5 * 60),
            min_refresh_interval: Duration::from_secs(10),
            clock_skew: Duration::from_secs(60),
        }
    }

    /// Attach a scope string; empty strings are treated as "no scope".
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        self.scope = if scope.is_empty() { None } else { Some(scope) };
        self
    }
}
