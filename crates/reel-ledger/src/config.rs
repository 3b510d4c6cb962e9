//! Ledger connection settings.

use std::time::Duration;

/// Default Redis set holding published content ids.
pub const DEFAULT_SET_KEY: &str = "uploaded_reels";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Store URL: `https://...` for the REST API, `redis://`/`rediss://` for native Redis
    pub url: String,
    /// Bearer token for the REST API
    pub token: Option<String>,
    /// Name of the set holding published ids
    pub set_key: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl LedgerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            set_key: DEFAULT_SET_KEY.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_set_key(mut self, set_key: impl Into<String>) -> Self {
        self.set_key = set_key.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the URL selects the native Redis protocol.
    pub fn is_native_redis(&self) -> bool {
        let url = self.url.trim().to_lowercase();
        url.starts_with("redis://") || url.starts_with("rediss://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_detection() {
        assert!(LedgerConfig::new("redis://localhost:6379").is_native_redis());
        assert!(LedgerConfig::new("rediss://user:pw@host:6380").is_native_redis());
        assert!(!LedgerConfig::new("https://eu1-fine-cat.upstash.io").is_native_redis());
    }

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::new("https://x");
        assert_eq!(config.set_key, "uploaded_reels");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.token.is_none());
    }
}
