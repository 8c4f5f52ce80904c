//! Upstream client configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the upstream feature API client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL for the feature API (e.g., "https://geois2.orb.ru/api").
    pub base_url: String,

    /// Basic-auth user applied to every call.
    pub username: String,

    /// Basic-auth password applied to every call.
    pub password: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Layer used when a caller does not name one.
    pub default_layer_id: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://geois2.orb.ru/api".to_string(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 30,
            default_layer_id: 8863,
        }
    }
}

impl UpstreamConfig {
    /// Config pointing at a local mock server.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: "test".to_string(),
            password: "test".to_string(),
            timeout_secs: 5,
            ..Self::default()
        }
    }

    /// Joins `path` onto the base URL without doubling slashes.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
