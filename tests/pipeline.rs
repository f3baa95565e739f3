//! End-to-end persistence pipeline tests: write-behind visibility, batch
//! completeness and drain-on-shutdown.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{Value, json};
use shortl::application::batcher::BatcherConfig;

use common::TestApp;

/// A batcher that will not flush on its own within the test.
fn manual_flush_config() -> BatcherConfig {
    BatcherConfig {
        batch_size: 1000,
        concurrency: 2,
        flush_interval: Duration::from_secs(600),
        flush_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_links_become_visible_after_drain() {
    let mut app = TestApp::spawn_with(manual_flush_config());

    let response = app
        .server
        .post("/encode")
        .json(&json!({ "url": "https://example.com/pending" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let short_url = body["short_url"].as_str().unwrap().to_string();

    // Nothing has flushed yet, so the link is not visible to decode.
    let response = app
        .server
        .post("/decode")
        .json(&json!({ "short_url": short_url }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    app.drain().await;

    let response = app
        .server
        .post("/decode")
        .json(&json!({ "short_url": short_url }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["url"], "https://example.com/pending");
}

#[tokio::test]
async fn test_every_accepted_link_is_persisted_exactly_once() {
    let mut app = TestApp::spawn_with(BatcherConfig {
        batch_size: 10,
        concurrency: 3,
        flush_interval: Duration::from_millis(25),
        flush_timeout: Duration::from_secs(5),
    });

    for i in 0..37 {
        let response = app
            .server
            .post("/encode")
            .json(&json!({ "url": format!("https://example.com/item/{i}") }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    app.drain().await;

    // The repository is keyed by link key, so 37 entries also proves no
    // key was used twice.
    assert_eq!(app.repository.len(), 37);
}

#[tokio::test]
async fn test_partial_batches_flush_on_timer_without_shutdown() {
    let app = TestApp::spawn_with(BatcherConfig {
        batch_size: 1000,
        concurrency: 2,
        flush_interval: Duration::from_millis(20),
        flush_timeout: Duration::from_secs(5),
    });

    for i in 0..3 {
        let response = app
            .server
            .post("/encode")
            .json(&json!({ "url": format!("https://example.com/timer/{i}") }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    app.wait_for_persisted(3).await;
}
