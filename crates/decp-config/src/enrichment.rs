//! Company-registry enrichment configuration.

use serde::{Deserialize, Serialize};

/// Updates written between two commits during a backfill.
const fn default_commit_every() -> usize {
    500
}

const fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    /// Base URL of the company-registry API.
    #[serde(default)]
    pub base_url: String,

    /// Bearer token for the company-registry API.
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_commit_every")]
    pub commit_every: usize,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl EnrichmentConfig {
    /// Returns `true` if both the API URL and the token are set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.token.is_empty()
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            commit_every: default_commit_every(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_not_configured() {
        let config = EnrichmentConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.commit_every, 500);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn configured_needs_url_and_token() {
        let config = EnrichmentConfig {
            base_url: "https://registry.example".into(),
            ..Default::default()
        };
        assert!(!config.is_configured());
    }
}
