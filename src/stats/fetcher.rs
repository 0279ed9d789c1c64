use reqwest::Url;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use super::types::{StatsQuery, StatsResult};
use crate::clock::{Clock, TokioClock};
use crate::credentials::Credentials;
use crate::error::{ChaturbateError, ChaturbateResult};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::retry::Backoff;

/// Default root of the stats API
pub const DEFAULT_BASE_URL: &str = "https://chaturbate.com";
/// Default per-attempt deadline in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 12_000;
/// Default number of retries after the first attempt
pub const DEFAULT_RETRIES: u32 = 2;

const STATS_PATH: &str = "/affiliates/apistats/";

/// Called with the redacted URL before each attempt
pub type RequestHook = Arc<dyn Fn(&str) + Send + Sync>;
/// Called with the redacted URL and the status after each response
pub type ResponseHook = Arc<dyn Fn(&str, u16) + Send + Sync>;

/// Options for [`fetch_stats`]
#[derive(Clone)]
pub struct StatsConfig {
    /// Root URL; a trailing slash is ignored
    pub base_url: String,
    /// Deadline for each individual attempt
    pub timeout: Duration,
    /// Retries after the first attempt
    pub retries: u32,
    /// Extra request headers, merged over `Accept: application/json`
    pub headers: HashMap<String, String>,
    pub before_request: Option<RequestHook>,
    pub after_response: Option<ResponseHook>,
    pub http_client: Arc<dyn HttpClient>,
    pub clock: Arc<dyn Clock>,
    pub backoff: Backoff,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retries: DEFAULT_RETRIES,
            headers: HashMap::new(),
            before_request: None,
            after_response: None,
            http_client: Arc::new(ReqwestHttpClient::new()),
            clock: Arc::new(TokioClock),
            backoff: Backoff::default(),
        }
    }
}

impl fmt::Debug for StatsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("before_request", &self.before_request.is_some())
            .field("after_response", &self.after_response.is_some())
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl StatsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.before_request = Some(Arc::new(hook));
        self
    }

    pub fn after_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, u16) + Send + Sync + 'static,
    {
        self.after_response = Some(Arc::new(hook));
        self
    }

    /// Total attempts, first one included
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Build the stats request URL. Unset query fields are omitted.
pub fn build_stats_url(
    base_url: &str,
    credentials: &Credentials,
    query: &StatsQuery,
) -> ChaturbateResult<String> {
    let root = base_url.trim_end_matches('/');
    let mut url = Url::parse(&format!("{}{}", root, STATS_PATH))
        .map_err(|e| ChaturbateError::config(format!("invalid base URL '{}': {}", base_url, e)))?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("username", credentials.username());
        pairs.append_pair("token", credentials.token());
        for (key, value) in query.params() {
            pairs.append_pair(key, value);
        }
    }

    Ok(url.to_string())
}

/// Fetch affiliate stats with per-attempt timeout and jittered retry.
///
/// Timeouts, transport failures, 429 and 5xx are retried up to
/// `config.retries` times; other HTTP errors are returned after the first
/// attempt. The result is normalized so `rows` is always populated.
///
/// A 2xx body that is not a JSON stats object is returned as a terminal
/// [`ChaturbateError::Decode`] rather than being passed through untyped.
#[instrument(skip_all, fields(username = %credentials.username()))]
pub async fn fetch_stats(
    credentials: &Credentials,
    query: Option<&StatsQuery>,
    config: &StatsConfig,
) -> ChaturbateResult<StatsResult> {
    let query = query.cloned().unwrap_or_default();
    let url = build_stats_url(&config.base_url, credentials, &query)?;
    let redacted = credentials.redact(&url);
    let max_attempts = config.max_attempts();

    let mut attempt = 0;
    loop {
        attempt += 1;

        let outcome = match send_attempt(&url, &redacted, config).await {
            Ok(body) => StatsResult::normalize(body, &query).map_err(ChaturbateError::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                if attempt > 1 {
                    info!(url = %redacted, attempts = attempt, "Stats request succeeded after retries");
                }
                return Ok(result);
            }
            Err(err) if err.is_retriable() && attempt < max_attempts => {
                let delay = config.backoff.delay_for(attempt);
                warn!(
                    url = %redacted,
                    error = %err,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    next_delay_ms = %delay.as_millis(),
                    "Stats request failed, retrying after delay"
                );
                config.clock.sleep(delay).await;
            }
            Err(err) => {
                error!(
                    url = %redacted,
                    error = %err,
                    attempts = attempt,
                    "Stats request failed"
                );
                return Err(err);
            }
        }
    }
}

/// One GET raced against the deadline. Returns the decoded body of a 2xx.
async fn send_attempt(url: &str, redacted: &str, config: &StatsConfig) -> ChaturbateResult<Value> {
    if let Some(hook) = &config.before_request {
        hook(redacted);
    }

    let mut headers = HashMap::from([("Accept".to_string(), "application/json".to_string())]);
    headers.extend(config.headers.clone());

    debug!(url = %redacted, timeout_ms = %config.timeout.as_millis(), "Sending stats request");

    let response = tokio::select! {
        biased;
        response = config.http_client.get(url, headers) => response?,
        _ = config.clock.sleep(config.timeout) => {
            return Err(ChaturbateError::Timeout(config.timeout));
        }
    };

    let status = response.status();
    if let Some(hook) = &config.after_response {
        hook(redacted, status);
    }

    let body = response.json_or_text();
    if !response.is_success() {
        return Err(ChaturbateError::http(status, body));
    }

    Ok(body.unwrap_or(Value::Null))
}
