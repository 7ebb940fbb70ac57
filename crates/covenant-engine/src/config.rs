//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::env;

/// Limits applied to every agreement of one deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum number of parties at creation.
    pub min_parties: usize,
    /// Maximum number of parties at creation.
    pub max_parties: usize,
    /// Maximum number of terms per agreement.
    pub max_terms: usize,
    /// Maximum byte length of titles, descriptions and names.
    pub max_text_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_parties: 2,
            max_parties: 64,
            max_terms: 256,
            max_text_len: 4096,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `COVENANT_MIN_PARTIES` (default: 2, never below 2)
    /// - `COVENANT_MAX_PARTIES` (default: 64)
    /// - `COVENANT_MAX_TERMS` (default: 256)
    /// - `COVENANT_MAX_TEXT_LEN` (default: 4096)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |key: &str, fallback: usize| {
            env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(fallback)
        };

        let min_parties = read("COVENANT_MIN_PARTIES", defaults.min_parties).max(2);
        Self {
            min_parties,
            max_parties: read("COVENANT_MAX_PARTIES", defaults.max_parties).max(min_parties),
            max_terms: read("COVENANT_MAX_TERMS", defaults.max_terms),
            max_text_len: read("COVENANT_MAX_TEXT_LEN", defaults.max_text_len),
        }
    }
}
