use std::time::Duration;
use thiserror::Error;

/// Errors produced by the stats fetcher and the events poller
#[derive(Error, Debug)]
pub enum ChaturbateError {
    /// Non-2xx response from the remote service
    #[error("HTTP {status}")]
    Http {
        /// Status code of the response
        status: u16,
        /// Decoded JSON body, or the raw text when it was not JSON
        body: Option<serde_json::Value>,
    },

    /// A single attempt ran past its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The injected transport failed before producing a response
    #[error(transparent)]
    Transport(#[from] anyhow::Error),

    /// JSON was required but the body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// One entry of an events batch could not be decoded
    #[error("Failed to decode event '{id}' ({method}): {reason}")]
    Event {
        id: String,
        method: String,
        reason: String,
    },

    /// The poller reached its configured consecutive-failure cap
    #[error("Poller gave up after {failures} consecutive failures")]
    GaveUp { failures: u32 },

    /// Invalid credentials or settings
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ChaturbateError {
    /// Create an HTTP error from a status and an optional body
    pub fn http(status: u16, body: Option<serde_json::Value>) -> Self {
        Self::Http { status, body }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Status code, if this error came from an HTTP response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the stats fetcher should spend a retry on this error.
    ///
    /// Timeouts and transport failures always qualify, HTTP errors only for
    /// 429 and 5xx. Decode and configuration errors never do.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Result alias used throughout the crate
pub type ChaturbateResult<T> = Result<T, ChaturbateError>;
