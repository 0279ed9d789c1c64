//! Client for the Chaturbate Events API and the affiliate stats endpoint.
//!
//! [`EventsPoller`] long-polls a broadcaster's event feed and hands each
//! event to registered callbacks. [`StatsClient`] fetches affiliate stats
//! with per-attempt deadlines and jittered retry.

pub mod callbacks;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod events;
pub mod http_client;
pub mod retry;
pub mod stats;

pub use crate::callbacks::{CallbackId, CallbackRegistry};
pub use crate::clock::{Clock, TokioClock};
pub use crate::config::ClientSettings;
pub use crate::credentials::Credentials;
pub use crate::error::{ChaturbateError, ChaturbateResult};
pub use crate::events::{Event, EventKind, EventPayload, EventRegistry, EventsPoller, PollerConfig};
pub use crate::http_client::{HttpClient, ReqwestHttpClient, SimpleHttpResponse};
pub use crate::retry::Backoff;
pub use crate::stats::{fetch_stats, StatsClient, StatsConfig, StatsQuery, StatsResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
