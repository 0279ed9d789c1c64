//! Events poller against a local server

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chaturbapi::{EventKind, EventsPoller, PollerConfig, ReqwestHttpClient};
use serde_json::json;

use crate::test_harness::{init_tracing, wait_until, Recorder};

fn config(server: &mockito::Server) -> PollerConfig {
    PollerConfig::new()
        .with_base_url(server.url())
        .with_interval(Duration::from_millis(20))
        .with_http_client(Arc::new(ReqwestHttpClient::new()))
}

#[tokio::test]
async fn test_follows_cursor_and_reports_failures() -> Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let next_url = format!("{}/events/alice/s3cret/?i=2", server.url());

    let first = server
        .mock("GET", "/events/alice/s3cret/")
        .match_query(mockito::Matcher::Missing)
        .with_status(200)
        .with_body(
            json!({
                "events": [
                    {
                        "id": "1",
                        "method": "chatMessage",
                        "object": {
                            "broadcaster": "alice",
                            "user": {"username": "bob", "gender": "m"},
                            "message": {"message": "hello", "color": "#fff", "font": "default"}
                        }
                    },
                    {
                        "id": "2",
                        "method": "tip",
                        "object": {
                            "broadcaster": "alice",
                            "user": {"username": "bob"},
                            "tip": {"tokens": 100, "isAnon": true, "message": ""}
                        }
                    }
                ],
                "nextUrl": next_url
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let failing = server
        .mock("GET", "/events/alice/s3cret/")
        .match_query(mockito::Matcher::UrlEncoded("i".into(), "2".into()))
        .with_status(502)
        .expect_at_least(2)
        .create_async()
        .await;

    let poller = EventsPoller::from_parts("alice", "s3cret", config(&server))?;

    let kinds = Recorder::new();
    let kinds_clone = kinds.clone();
    poller.on_any(move |event| {
        kinds_clone.push(event.kind());
        Ok(())
    });
    let chat = Recorder::new();
    let chat_clone = chat.clone();
    poller.registry().on_chat_message(move |msg| {
        chat_clone.push(msg.message.message.clone());
        Ok(())
    });
    let tips = Recorder::new();
    let tips_clone = tips.clone();
    poller.on_tip(move |tip| {
        tips_clone.push((tip.tip.tokens, tip.tip.is_anon));
        Ok(())
    });
    let errors = Recorder::new();
    let errors_clone = errors.clone();
    poller.on_error(move |err| {
        errors_clone.push(err.status());
        Ok(())
    });

    poller.start();
    assert!(poller.is_running());
    wait_until(|| errors.len() >= 2).await;
    poller.shutdown().await;

    assert!(!poller.is_running());
    assert_eq!(kinds.items(), vec![EventKind::ChatMessage, EventKind::Tip]);
    assert_eq!(chat.items(), vec!["hello".to_string()]);
    assert_eq!(tips.items(), vec![(100, true)]);
    assert!(errors.items().iter().all(|status| *status == Some(502)));
    first.assert_async().await;
    failing.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_gives_up_when_capped() -> Result<()> {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/events/alice/s3cret/")
        .with_status(500)
        .expect(2)
        .create_async()
        .await;

    let poller = EventsPoller::from_parts(
        "alice",
        "s3cret",
        config(&server).with_max_consecutive_failures(Some(2)),
    )?;
    let errors = Recorder::new();
    let errors_clone = errors.clone();
    poller.on_error(move |err| {
        errors_clone.push(err.to_string());
        Ok(())
    });

    poller.start();
    wait_until(|| !poller.is_running()).await;
    poller.shutdown().await;

    let errors = errors.items();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0], "HTTP 500");
    assert!(errors[2].contains("gave up"));
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_session_url_masks_token() -> Result<()> {
    let server = mockito::Server::new_async().await;
    let poller = EventsPoller::from_parts("alice", "s3cret", config(&server))?;

    assert_eq!(
        poller.session_url(),
        format!("{}/events/alice/****/", server.url())
    );
    assert!(!format!("{poller:?}").contains("s3cret"));
    Ok(())
}
