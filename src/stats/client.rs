use tracing::instrument;

use super::fetcher::{fetch_stats, StatsConfig};
use super::types::{StatsQuery, StatsResult};
use crate::callbacks::{CallbackId, CallbackRegistry};
use crate::credentials::Credentials;
use crate::error::{ChaturbateError, ChaturbateResult};

/// Affiliate stats client bound to one account.
///
/// Every call to [`StatsClient::get_stats`] notifies `stats_updated`
/// listeners on success and `error` listeners on failure before returning.
pub struct StatsClient {
    credentials: Credentials,
    config: StatsConfig,
    stats_updated: CallbackRegistry<StatsResult>,
    errors: CallbackRegistry<ChaturbateError>,
}

impl StatsClient {
    pub fn new(credentials: Credentials, config: StatsConfig) -> Self {
        Self {
            credentials,
            config,
            stats_updated: CallbackRegistry::with_group("stats_updated"),
            errors: CallbackRegistry::with_group("stats_error"),
        }
    }

    /// Build a client from a raw username and token
    pub fn from_parts(
        username: impl Into<String>,
        token: impl Into<String>,
        config: StatsConfig,
    ) -> ChaturbateResult<Self> {
        Ok(Self::new(Credentials::new(username, token)?, config))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// Fetch stats and notify listeners of the outcome
    #[instrument(skip(self), fields(username = %self.credentials.username()))]
    pub async fn get_stats(&self, query: Option<StatsQuery>) -> ChaturbateResult<StatsResult> {
        match fetch_stats(&self.credentials, query.as_ref(), &self.config).await {
            Ok(stats) => {
                self.stats_updated.trigger(&stats);
                Ok(stats)
            }
            Err(e) => {
                self.errors.trigger(&e);
                Err(e)
            }
        }
    }

    /// Listen for successful fetches
    pub fn on_stats_updated<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&StatsResult) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.stats_updated.register(callback)
    }

    /// Listen for failed fetches
    pub fn on_error<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&ChaturbateError) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.errors.register(callback)
    }

    /// Remove a listener registered with either `on_*` method
    pub fn unsubscribe(&self, id: CallbackId) -> bool {
        self.stats_updated.unregister(id) || self.errors.unregister(id)
    }
}
