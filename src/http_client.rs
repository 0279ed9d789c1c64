use anyhow::Result;
use std::collections::HashMap;

/// Status and body of a completed request
#[derive(Debug, Clone)]
pub struct SimpleHttpResponse {
    /// HTTP status code
    status_code: u16,
    /// Response body
    body: String,
}

impl SimpleHttpResponse {
    /// Create a new response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status_code: status,
            body: body.into(),
        }
    }

    /// Get the status code
    pub fn status(&self) -> u16 {
        self.status_code
    }

    /// Get a reference to the response body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Get the body as text (consumes the response)
    pub fn text(self) -> String {
        self.body
    }

    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// Body decoded as JSON, falling back to the raw text; `None` when empty
    pub fn json_or_text(&self) -> Option<serde_json::Value> {
        if self.body.is_empty() {
            return None;
        }
        Some(
            serde_json::from_str(&self.body)
                .unwrap_or_else(|_| serde_json::Value::String(self.body.clone())),
        )
    }

    /// Check if successful (2xx status)
    pub fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }
}

/// Transport seam used by both the stats fetcher and the events poller.
///
/// Implementations perform a single GET and report whatever status the server
/// answered with; only failures to obtain a response at all are errors.
/// Dropping the returned future cancels the request.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform HTTP GET request and return a SimpleHttpResponse
    async fn get(&self, url: &str, headers: HashMap<String, String>) -> Result<SimpleHttpResponse>;
}

/// Implementation of HttpClient using reqwest
#[derive(Clone, Default)]
pub struct ReqwestHttpClient {
    /// Internal reqwest client
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new client with custom configuration
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: HashMap<String, String>) -> Result<SimpleHttpResponse> {
        let mut request = self.client.get(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(SimpleHttpResponse::new(status, body))
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockHttpClient;
    use super::*;

    #[tokio::test]
    async fn test_mock_http_client() -> Result<()> {
        let client = MockHttpClient::new();

        client.mock_response("https://example.com/api", 200, "Hello, world!");

        let test_data = serde_json::json!({
            "events": [{"id": "1", "method": "follow"}]
        });
        client.mock_success_json("https://example.com/api/json", &test_data)?;

        client.mock_response("https://example.com/api/error", 404, "Not found");

        let response = client.get("https://example.com/api", HashMap::new()).await?;
        assert_eq!(response.status(), 200);
        assert!(response.is_success());
        assert_eq!(response.text(), "Hello, world!");

        let response = client
            .get("https://example.com/api/json", HashMap::new())
            .await?;
        let json: serde_json::Value = response.json()?;
        assert_eq!(json, test_data);

        let response = client
            .get("https://example.com/api/error", HashMap::new())
            .await?;
        assert_eq!(response.status(), 404);
        assert!(!response.is_success());
        assert_eq!(
            response.json_or_text(),
            Some(serde_json::Value::String("Not found".into()))
        );
        assert_eq!(SimpleHttpResponse::new(204, "").json_or_text(), None);

        let result = client
            .get("https://example.com/not-found", HashMap::new())
            .await;
        assert!(result.is_err());

        let requests = client.requested_urls();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0], "https://example.com/api");

        Ok(())
    }

    #[tokio::test]
    async fn test_mock_replays_script_then_repeats_last() -> Result<()> {
        let client = MockHttpClient::new();
        client.mock_error("https://example.com/flaky", "connection reset");
        client.mock_response("https://example.com/flaky", 503, "");
        client.mock_response("https://example.com/flaky", 200, "ok");

        assert!(client
            .get("https://example.com/flaky", HashMap::new())
            .await
            .is_err());
        let second = client.get("https://example.com/flaky", HashMap::new()).await?;
        assert_eq!(second.status(), 503);
        let third = client.get("https://example.com/flaky", HashMap::new()).await?;
        assert_eq!(third.status(), 200);
        let fourth = client.get("https://example.com/flaky", HashMap::new()).await?;
        assert_eq!(fourth.status(), 200);
        Ok(())
    }
}
