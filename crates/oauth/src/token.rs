//! The cached, in-memory representation of one acquired access token.

use std::time::{Duration, Instant};

/// An access token plus the bookkeeping needed to decide when to refresh it.
#[derive(Debug, Clone)]
pub struct OAuthTokenRecord {
    /// The bearer token value.
    pub access_token: String,
    /// The refresh token to present on the next rotation, if the IdP issued
    /// one. Absent only before the very first fetch populates it, or for an
    /// IdP that never rotates refresh tokens.
    pub refresh_token: Option<String>,
    /// When this record was written into the cache.
    pub obtained_at: Instant,
    /// Expiry, already adjusted for clock skew at storage time.
    pub expires_at: Instant,
}

impl OAuthTokenRecord {
    /// `expires_in` is the IdP-reported lifetime in seconds; `clock_skew`
    /// is subtracted once here so every later comparison against
    /// `expires_at` is already conservative.
    #[must_use]
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: Duration, clock_skew: Duration) -> Self {
        let now = Instant::now();
        let adjusted_lifetime = expires_in.saturating_sub(clock_skew);
        Self { access_token, refresh_token, obtained_at: now, expires_at: now + adjusted_lifetime }
    }

    /// Whether this token should be refreshed now, given a pre-expiry buffer.
    #[must_use]
    pub fn needs_refresh(&self, refresh_buffer: Duration) -> bool {
        Instant::now() + refresh_buffer >= self.expires_at
    }

    /// How long ago this record was written — doubles as `now - lastRefreshAt`
    /// (spec §4.6 step 2), since a record is only ever rewritten on a
    /// successful refresh.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.obtained_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_does_not_need_refresh() {
        let record = OAuthTokenRecord::new("tok".into(), Some("rt".into()), Duration::from_secs(3600), Duration::from_secs(60));
        assert!(!record.needs_refresh(Duration::from_secs(300)));
    }

    #[test]
    fn token_near_expiry_needs_refresh() {
        let record = OAuthTokenRecord::new("tok".into(), Some("rt".into()), Duration::from_secs(60), Duration::from_secs(0));
        assert!(record.needs_refresh(Duration::from_secs(300)));
    }

    #[test]
    fn clock_skew_is_subtracted_once_from_lifetime() {
        let record = OAuthTokenRecord::new("tok".into(), Some("rt".into()), Duration::from_secs(120), Duration::from_secs(60));
        let remaining = record.expires_at.saturating_duration_since(record.obtained_at);
        assert_eq!(remaining, Duration::from_secs(60));
    }

    #[test]
    fn refresh_token_is_retained_across_rotation() {
        let record = OAuthTokenRecord::new("tok".into(), Some("rt-1".into()), Duration::from_secs(3600), Duration::from_secs(60));
        assert_eq!(record.refresh_token.as_deref(), Some("rt-1"));
    }
}
