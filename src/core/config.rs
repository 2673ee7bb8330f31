use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::core::error::Result;

/// Query-core configuration.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound for any facet page, regardless of what the request asks for
    pub max_page_size: usize,

    /// Facets queried within this window on the old generation are pre-warmed
    /// on the new one. Zero disables pre-warming.
    pub prewarm_facets_max_age_ms: u64,

    /// How long `swap` waits for pre-warming before letting it finish in the background
    pub prewarm_facets_sync_wait_ms: u64,

    /// Checkout retries against a retiring generation before giving up
    pub checkout_retry_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_page_size: 1024,
            prewarm_facets_max_age_ms: 10 * 60 * 1000, // 10 minutes
            prewarm_facets_sync_wait_ms: 3 * 1000,     // 3 seconds
            checkout_retry_limit: 1024,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn prewarm_facets_max_age(&self) -> Duration {
        Duration::from_millis(self.prewarm_facets_max_age_ms)
    }

    pub fn prewarm_facets_sync_wait(&self) -> Duration {
        Duration::from_millis(self.prewarm_facets_sync_wait_ms)
    }

    pub fn with_prewarm(mut self, max_age: Duration, sync_wait: Duration) -> Self {
        self.prewarm_facets_max_age_ms = max_age.as_millis() as u64;
        self.prewarm_facets_sync_wait_ms = sync_wait.as_millis() as u64;
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }
}
