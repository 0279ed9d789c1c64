use reqwest::Url;
use std::fmt;

use crate::error::{ChaturbateError, ChaturbateResult};

/// Replacement shown wherever the token would otherwise appear
pub const TOKEN_MASK: &str = "****";

/// Environment variable holding the account name
pub const USERNAME_ENV: &str = "CHATURBATE_USERNAME";
/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "CHATURBATE_TOKEN";

/// Account name and API token used by both endpoints.
///
/// The token is never printed: `Debug` masks it, and [`Credentials::redact`]
/// strips it from URLs before they reach hooks or log lines.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    token: String,
}

impl Credentials {
    /// Create credentials, rejecting empty values
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> ChaturbateResult<Self> {
        let username = username.into();
        let token = token.into();

        if username.trim().is_empty() {
            return Err(ChaturbateError::config("username must not be empty"));
        }
        if token.trim().is_empty() {
            return Err(ChaturbateError::config("token must not be empty"));
        }

        Ok(Self { username, token })
    }

    /// Read credentials from `CHATURBATE_USERNAME` / `CHATURBATE_TOKEN`,
    /// loading a `.env` file first if one is present
    pub fn from_env() -> ChaturbateResult<Self> {
        let _ = dotenvy::dotenv();

        let username = std::env::var(USERNAME_ENV)
            .map_err(|_| ChaturbateError::config(format!("{} is not set", USERNAME_ENV)))?;
        let token = std::env::var(TOKEN_ENV)
            .map_err(|_| ChaturbateError::config(format!("{} is not set", TOKEN_ENV)))?;

        Self::new(username, token)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Mask the token wherever it appears in `url`.
    ///
    /// Covers the `token` query parameter used by the stats endpoint and the
    /// path segment used by the events endpoint. Unparseable input falls back
    /// to a plain text replacement.
    pub fn redact(&self, url: &str) -> String {
        let Ok(mut parsed) = Url::parse(url) else {
            return url.replace(&self.token, TOKEN_MASK);
        };

        let encoded_token = encode_path_segment(&self.token);
        let masked_path = parsed
            .path_segments()
            .map(|segments| {
                segments
                    .map(|segment| {
                        if segment == encoded_token || segment == self.token {
                            TOKEN_MASK
                        } else {
                            segment
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("/")
            });
        if let Some(path) = masked_path {
            parsed.set_path(&path);
        }

        if parsed.query_pairs().any(|(key, _)| key == "token") {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(key, value)| {
                    let value = if key == "token" {
                        TOKEN_MASK.to_string()
                    } else {
                        value.into_owned()
                    };
                    (key.into_owned(), value)
                })
                .collect();
            parsed.query_pairs_mut().clear().extend_pairs(pairs);
        }

        parsed.to_string()
    }
}

/// Percent-encode `value` the way it would appear as a single path segment
fn encode_path_segment(value: &str) -> String {
    let mut scratch = match Url::parse("http://localhost/") {
        Ok(url) => url,
        Err(_) => return value.to_string(),
    };
    if let Ok(mut segments) = scratch.path_segments_mut() {
        segments.clear().push(value);
    }
    scratch.path().trim_start_matches('/').to_string()
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &TOKEN_MASK)
            .finish()
    }
}
