//! Long-poll loop over the Events API

use reqwest::Url;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::registry::EventRegistry;
use super::types::{
    ChatMessageEvent, Event, EventKind, EventsBatch, MediaPurchaseEvent, PrivateMessageEvent,
    RoomSubjectChangeEvent, TipEvent,
};
use crate::callbacks::CallbackId;
use crate::clock::{Clock, TokioClock};
use crate::credentials::Credentials;
use crate::error::{ChaturbateError, ChaturbateResult};
use crate::http_client::{HttpClient, ReqwestHttpClient};

/// Default root of the Events API
pub const DEFAULT_EVENTS_BASE_URL: &str = "https://eventsapi.chaturbate.com";
/// Pause after a failed poll, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

/// Options for [`EventsPoller`]
#[derive(Clone)]
pub struct PollerConfig {
    /// Root URL; a trailing slash is ignored
    pub base_url: String,
    /// Pause between a failed poll and the next attempt
    pub interval: Duration,
    /// Give up after this many failures in a row; `None` polls forever
    pub max_consecutive_failures: Option<u32>,
    pub http_client: Arc<dyn HttpClient>,
    pub clock: Arc<dyn Clock>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EVENTS_BASE_URL.to_string(),
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_consecutive_failures: None,
            http_client: Arc::new(ReqwestHttpClient::new()),
            clock: Arc::new(TokioClock),
        }
    }
}

impl fmt::Debug for PollerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollerConfig")
            .field("base_url", &self.base_url)
            .field("interval", &self.interval)
            .field("max_consecutive_failures", &self.max_consecutive_failures)
            .finish()
    }
}

impl PollerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_consecutive_failures(mut self, max: Option<u32>) -> Self {
        self.max_consecutive_failures = max;
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
}

/// Build `{base}/events/{username}/{token}/`
pub fn build_events_url(base_url: &str, credentials: &Credentials) -> ChaturbateResult<String> {
    let invalid =
        |reason: String| ChaturbateError::config(format!("invalid events URL '{}': {}", base_url, reason));

    let mut url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base".to_string()))?
        .pop_if_empty()
        .push("events")
        .push(credentials.username())
        .push(credentials.token())
        .push("");

    Ok(url.to_string())
}

/// One running loop. Each `start` gets a fresh stop flag, so a loop that is
/// still winding down never sees the flag of its successor.
struct Session {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Session {
    fn is_active(&self) -> bool {
        !self.stop.load(Ordering::SeqCst) && !self.handle.is_finished()
    }
}

struct PollerInner {
    credentials: Credentials,
    config: PollerConfig,
    /// Session URL the cursor starts from and falls back to
    base_url: String,
    registry: EventRegistry,
}

/// Long-polls the Events API and dispatches each event to subscribers.
///
/// The loop follows the `nextUrl` cursor of every successful response
/// without pausing. A failed poll is reported on the error channel and
/// retried against the same URL after [`PollerConfig::interval`].
pub struct EventsPoller {
    inner: Arc<PollerInner>,
    session: Mutex<Option<Session>>,
}

impl fmt::Debug for EventsPoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventsPoller")
            .field("credentials", &self.inner.credentials)
            .field("config", &self.inner.config)
            .field("running", &self.is_running())
            .finish()
    }
}

impl EventsPoller {
    pub fn new(credentials: Credentials, config: PollerConfig) -> ChaturbateResult<Self> {
        let base_url = build_events_url(&config.base_url, &credentials)?;
        Ok(Self {
            inner: Arc::new(PollerInner {
                credentials,
                config,
                base_url,
                registry: EventRegistry::new(),
            }),
            session: Mutex::new(None),
        })
    }

    pub fn from_parts(
        username: impl Into<String>,
        token: impl Into<String>,
        config: PollerConfig,
    ) -> ChaturbateResult<Self> {
        Self::new(Credentials::new(username, token)?, config)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// Session URL with the token masked
    pub fn session_url(&self) -> String {
        self.inner.credentials.redact(&self.inner.base_url)
    }

    /// Subscription channels
    pub fn registry(&self) -> &EventRegistry {
        &self.inner.registry
    }

    pub fn on_any<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.registry.on_any(callback)
    }

    pub fn on<F>(&self, kind: EventKind, callback: F) -> CallbackId
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.registry.on(kind, callback)
    }

    pub fn on_error<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&ChaturbateError) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.registry.on_error(callback)
    }

    pub fn on_tip<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&TipEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.registry.on_tip(callback)
    }

    pub fn on_chat_message<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&ChatMessageEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.registry.on_chat_message(callback)
    }

    pub fn on_private_message<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&PrivateMessageEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.registry.on_private_message(callback)
    }

    pub fn on_room_subject_change<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&RoomSubjectChangeEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.registry.on_room_subject_change(callback)
    }

    pub fn on_media_purchase<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&MediaPurchaseEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.registry.on_media_purchase(callback)
    }

    pub fn unsubscribe(&self, id: CallbackId) -> bool {
        self.inner.registry.unsubscribe(id)
    }

    /// Start polling from the session URL. Does nothing if a loop is running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if session.as_ref().is_some_and(Session::is_active) {
            warn!(url = %self.session_url(), "Events poller is already running");
            return;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let inner = Arc::clone(&self.inner);
        let loop_stop = Arc::clone(&stop);
        let handle = tokio::spawn(async move {
            inner.run(loop_stop).await;
        });

        info!(url = %self.session_url(), "Events poller started");
        *session = Some(Session { stop, handle });
    }

    /// Ask the loop to exit. An in-flight request is allowed to finish; no
    /// further request is made once it has.
    pub fn stop(&self) {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = session.as_ref() {
            if !session.stop.swap(true, Ordering::SeqCst) {
                debug!("Stop requested for events poller");
            }
        }
    }

    /// Stop and wait for the loop to exit
    pub async fn shutdown(&self) {
        let session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(Session { stop, handle }) = session {
            stop.store(true, Ordering::SeqCst);
            if let Err(e) = handle.await {
                error!(error = %e, "Events poll task ended abnormally");
            }
        }
    }

    /// Whether a loop is running and has not been asked to stop
    pub fn is_running(&self) -> bool {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Session::is_active)
    }
}

impl Drop for EventsPoller {
    fn drop(&mut self) {
        let session = self
            .session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        // Nothing can stop the loop once the poller is gone.
        if let Some(Session { stop, handle }) = session {
            stop.store(true, Ordering::SeqCst);
            if !handle.is_finished() {
                handle.abort();
                debug!("Aborted events poll task on drop");
            }
        }
    }
}

impl PollerInner {
    #[instrument(skip_all, fields(username = %self.credentials.username()))]
    async fn run(&self, stop: Arc<AtomicBool>) {
        let mut cursor = self.base_url.clone();
        let mut failures: u32 = 0;

        while !stop.load(Ordering::SeqCst) {
            match self.poll_once(&cursor).await {
                Ok(next) => {
                    if failures > 0 {
                        info!(failures = failures, "Events poll recovered");
                    }
                    failures = 0;
                    cursor = next;
                }
                Err(err) => {
                    failures = failures.saturating_add(1);
                    warn!(
                        url = %self.credentials.redact(&cursor),
                        error = %err,
                        failures = failures,
                        "Events poll failed"
                    );
                    self.registry.dispatch_error(&err);

                    if let Some(max) = self.config.max_consecutive_failures {
                        if failures >= max {
                            let gave_up = ChaturbateError::GaveUp { failures };
                            error!(failures = failures, "Events poller giving up");
                            self.registry.dispatch_error(&gave_up);
                            break;
                        }
                    }

                    self.config.clock.sleep(self.config.interval).await;
                }
            }
        }

        info!("Events poll loop stopped");
    }

    /// Fetch one batch, dispatch it, and return the next cursor
    async fn poll_once(&self, cursor: &str) -> ChaturbateResult<String> {
        debug!(url = %self.credentials.redact(cursor), "Polling events");

        let headers = HashMap::from([("Accept".to_string(), "application/json".to_string())]);
        let response = self.config.http_client.get(cursor, headers).await?;

        if !response.is_success() {
            return Err(ChaturbateError::http(response.status(), response.json_or_text()));
        }

        let batch: EventsBatch = response.json()?;
        let events = batch.events.unwrap_or_default();
        if !events.is_empty() {
            debug!(count = events.len(), "Received events");
        }

        for raw in &events {
            match Event::from_value(raw) {
                Ok(event) => {
                    self.registry.dispatch(&event);
                }
                Err(err) => {
                    warn!(error = %err, "Skipping undecodable event");
                    self.registry.dispatch_error(&err);
                }
            }
        }

        Ok(batch
            .next_url
            .filter(|next| !next.is_empty())
            .unwrap_or_else(|| self.base_url.clone()))
    }
}
