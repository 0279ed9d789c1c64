use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use crate::error::{ChaturbateError, ChaturbateResult};
use crate::events::poller::{PollerConfig, DEFAULT_EVENTS_BASE_URL, DEFAULT_POLL_INTERVAL_MS};
use crate::stats::fetcher::{StatsConfig, DEFAULT_BASE_URL, DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS};

/// Tunables shared by the stats client and the events poller.
///
/// Every field falls back to a `CHATURBATE_*` environment variable and then
/// to the built-in default, both when deserializing and in `Default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Root of the stats API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Root of the Events API
    #[serde(default = "default_events_base_url")]
    pub events_base_url: String,
    /// Per-attempt deadline for stats requests
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Stats retries after the first attempt
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Pause after a failed events poll
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Stop polling after this many failures in a row
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: Option<u32>,
}

fn env_or<T: FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(fallback)
}

// Default functions
fn default_base_url() -> String {
    std::env::var("CHATURBATE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn default_events_base_url() -> String {
    std::env::var("CHATURBATE_EVENTS_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_EVENTS_BASE_URL.to_string())
}

fn default_timeout_ms() -> u64 {
    env_or("CHATURBATE_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)
}

fn default_retries() -> u32 {
    env_or("CHATURBATE_RETRIES", DEFAULT_RETRIES)
}

fn default_poll_interval_ms() -> u64 {
    env_or("CHATURBATE_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)
}

fn default_max_consecutive_failures() -> Option<u32> {
    std::env::var("CHATURBATE_MAX_CONSECUTIVE_FAILURES")
        .ok()
        .and_then(|val| val.parse().ok())
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            events_base_url: default_events_base_url(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            poll_interval_ms: default_poll_interval_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

impl ClientSettings {
    /// Settings from the environment, loading a `.env` file first if present
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::default()
    }

    /// Settings from a JSON document; missing fields use the defaults
    pub fn from_json(json: &str) -> ChaturbateResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ChaturbateError::config(format!("invalid settings: {}", e)))
    }

    /// Settings from a JSON file
    pub async fn load(path: &Path) -> ChaturbateResult<Self> {
        let contents = fs::read_to_string(path).await.map_err(|e| {
            ChaturbateError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let settings = Self::from_json(&contents)?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Stats options with the default transport and clock
    pub fn stats_config(&self) -> StatsConfig {
        StatsConfig::new()
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_retries(self.retries)
    }

    /// Poller options with the default transport and clock
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig::new()
            .with_base_url(self.events_base_url.clone())
            .with_interval(Duration::from_millis(self.poll_interval_ms))
            .with_max_consecutive_failures(self.max_consecutive_failures)
    }
}
