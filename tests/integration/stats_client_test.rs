//! Stats client against a local server

use std::sync::Arc;

use anyhow::Result;
use chaturbapi::{ChaturbateError, ReqwestHttpClient, StatsClient, StatsConfig, StatsQuery};
use mockito::Matcher;
use serde_json::json;

use crate::test_harness::{fast_backoff, init_tracing, Recorder};

const STATS_PATH: &str = "/affiliates/apistats/";

fn config(server: &mockito::Server) -> StatsConfig {
    StatsConfig::new()
        .with_base_url(server.url())
        .with_http_client(Arc::new(ReqwestHttpClient::new()))
        .with_backoff(fast_backoff())
}

#[tokio::test]
async fn test_fetches_rows_with_query() -> Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", STATS_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("username".into(), "alice".into()),
            Matcher::UrlEncoded("token".into(), "s3cret".into()),
            Matcher::UrlEncoded("range".into(), "last_7_days".into()),
            Matcher::UrlEncoded("breakdown".into(), "day".into()),
        ]))
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "range": "last_7_days",
                "breakdown": "day",
                "columns": ["date", "tokens"],
                "rows": [{"date": "2024-01-01", "tokens": 40}],
                "totals": {"tokens": 40}
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = StatsClient::from_parts("alice", "s3cret", config(&server))?;
    let updates = Recorder::new();
    let updates_clone = updates.clone();
    client.on_stats_updated(move |stats| {
        updates_clone.push(stats.rows.len());
        Ok(())
    });

    let query = StatsQuery::new().range("last_7_days").breakdown("day");
    let stats = client.get_stats(Some(query)).await?;

    assert_eq!(stats.range, "last_7_days");
    assert_eq!(stats.columns, vec!["date", "tokens"]);
    assert_eq!(stats.rows[0]["tokens"], json!(40));
    assert_eq!(updates.items(), vec![1]);
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_legacy_stats_shape_is_normalized() -> Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", STATS_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"stats": [{"tokens": 3}, {"tokens": 4}]}"#)
        .create_async()
        .await;

    let client = StatsClient::from_parts("alice", "s3cret", config(&server))?;
    let stats = client.get_stats(None).await?;

    assert_eq!(stats.range, "unknown");
    assert_eq!(stats.breakdown, "none");
    assert_eq!(stats.rows.len(), 2);
    assert!(stats.is_legacy());
    Ok(())
}

#[tokio::test]
async fn test_server_errors_are_retried() -> Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", STATS_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("upstream unavailable")
        .expect(3)
        .create_async()
        .await;

    let client = StatsClient::from_parts("alice", "s3cret", config(&server).with_retries(2))?;
    let errors = Recorder::new();
    let errors_clone = errors.clone();
    client.on_error(move |err| {
        errors_clone.push(err.status());
        Ok(())
    });

    let err = client.get_stats(None).await.unwrap_err();

    match err {
        ChaturbateError::Http { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, Some(json!("upstream unavailable")));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(errors.items(), vec![Some(503)]);
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_client_errors_are_not_retried() -> Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", STATS_PATH)
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"detail": "bad token"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = StatsClient::from_parts("alice", "s3cret", config(&server).with_retries(5))?;
    let err = client.get_stats(None).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_hooks_never_see_the_token() -> Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", STATS_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"rows": []}"#)
        .create_async()
        .await;

    let seen = Recorder::new();
    let before = seen.clone();
    let after = seen.clone();
    let config = config(&server)
        .before_request(move |url| before.push(url.to_string()))
        .after_response(move |url, status| after.push(format!("{status} {url}")));

    let client = StatsClient::from_parts("alice", "s3cret", config)?;
    client.get_stats(None).await?;

    let seen = seen.items();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|line| !line.contains("s3cret")));
    assert!(seen[0].contains("token=****"));
    assert!(seen[1].starts_with("200 "));
    Ok(())
}
