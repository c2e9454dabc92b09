use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};

/// Connection settings for the publication platform.
///
/// Built once and passed to every component that talks to the platform.
#[derive(Clone, Deserialize)]
pub struct PlatformConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
}

impl PlatformConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Base URL without a trailing slash.
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn trace_loaded(&self) {
        info!(
            base_url = %self.api_root(),
            api_key_set = !self.api_key.is_empty(),
            api_secret_set = !self.api_secret.is_empty(),
            "Loaded PlatformConfig"
        );
        debug!(?self, "PlatformConfig loaded (full debug)");
    }
}

impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
