//! End-to-end runs of the orchestration API over the local adapters.
#![cfg(feature = "local")]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use etl_pipeline::adapters::http::router;
use etl_pipeline::adapters::local::{events, EventHub, FsObjectStore, LocalJobRunner};
use etl_pipeline::application::{
    dispatcher::DispatcherService, ingest::IngestService, pipeline::PipelineService,
};
use etl_pipeline::config::PipelineConfig;
use etl_pipeline::ports::storage::ObjectStorePort;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    dir: TempDir,
    store: FsObjectStore,
    app: Router,
}

fn harness(notifications: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(PipelineConfig::default());
    let hub = Arc::new(EventHub::new());

    let mut store = FsObjectStore::new(dir.path());
    if notifications {
        store = store.with_notifications(hub.clone(), config.landing_bucket.clone());
    }
    let jobs = LocalJobRunner::new(store.clone(), config.job_name.clone());
    let dispatcher = Arc::new(DispatcherService::new(store.clone(), jobs, config.clone()));
    if notifications {
        events::listener::start(hub, dispatcher.clone());
    }
    let ingest = IngestService::new(store.clone(), config);
    let app = router(Arc::new(PipelineService::new(ingest, dispatcher)));

    Harness {
        dir,
        store,
        app,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    send(app, Request::get(path).body(Body::empty()).unwrap()).await
}

/// Polls the job endpoint until the run leaves its active states.
async fn finished_run(app: &Router, run_id: &str) -> Value {
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let (status, run) = get(app, &format!("/etl/jobs/{run_id}")).await;
        assert_eq!(status, StatusCode::OK);
        let state = run["state"].as_str().unwrap_or_default().to_string();
        if ["SUCCEEDED", "FAILED"].contains(&state.as_str())
            || tokio::time::Instant::now() >= deadline
        {
            return run;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

async fn wait_for_object(store: &FsObjectStore, bucket: &str, key: &str) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if store.get_object(bucket, key).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn upload_lands_in_default_bucket() {
    let h = harness(false);

    let (status, body) = post(
        &h.app,
        "/etl/upload",
        json!({ "key": "orders/1.json", "content": "{\"id\":1}" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "bucket": "etl-source-bucket", "key": "orders/1.json" }));

    let stored = h
        .store
        .get_object("etl-source-bucket", "orders/1.json")
        .await
        .unwrap();
    assert_eq!(stored.content.as_ref(), b"{\"id\":1}");
    assert_eq!(stored.content_type, "application/json");
    assert!(!stored.metadata.contains_key("pipeline-output-bucket"));
}

#[tokio::test]
async fn run_then_query_job() {
    let h = harness(false);

    let (status, body) = post(
        &h.app,
        "/etl/run",
        json!({ "key": "orders/1.json", "content": "{\"name\":\"ada\"}" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bucket"], "etl-source-bucket");
    let run_id = body["jobRunId"].as_str().unwrap().to_string();

    let run = finished_run(&h.app, &run_id).await;
    assert_eq!(run["id"], run_id.as_str());
    assert_eq!(run["jobName"], "etl-demo-job");
    assert_eq!(run["state"], "SUCCEEDED");
    assert_eq!(run["arguments"]["--SOURCE_BUCKET"], "etl-source-bucket");
    assert_eq!(run["arguments"]["--SOURCE_KEY"], "orders/1.json");
    assert_eq!(run["arguments"]["--OUTPUT_BUCKET"], "etl-transformed-bucket");

    let output = h
        .store
        .get_object("etl-transformed-bucket", "transformed/orders/1.json")
        .await
        .unwrap();
    let record: Value = serde_json::from_slice(&output.content).unwrap();
    assert_eq!(record["uppercase_name"], "ADA");
}

#[tokio::test]
async fn requested_output_bucket_wins() {
    let h = harness(false);

    let (status, body) = post(
        &h.app,
        "/etl/run",
        json!({
            "key": "reports/daily.json",
            "content": "{}",
            "contentType": "text/plain",
            "outputBucket": "custom-out"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let stored = h
        .store
        .get_object("etl-source-bucket", "reports/daily.json")
        .await
        .unwrap();
    assert_eq!(stored.content_type, "text/plain");
    assert_eq!(stored.metadata["pipeline-output-bucket"], "custom-out");

    let run = finished_run(&h.app, body["jobRunId"].as_str().unwrap()).await;
    assert_eq!(run["arguments"]["--OUTPUT_BUCKET"], "custom-out");
    assert!(wait_for_object(&h.store, "custom-out", "transformed/reports/daily.json").await);
}

#[tokio::test]
async fn notification_alone_starts_a_run() {
    let h = harness(true);

    let (status, _) = post(
        &h.app,
        "/etl/upload",
        json!({ "key": "events/signup.json", "content": "{\"name\":\"grace\"}" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert!(
        wait_for_object(
            &h.store,
            "etl-transformed-bucket",
            "transformed/events/signup.json"
        )
        .await
    );
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let h = harness(false);

    let (status, body) = post(&h.app, "/etl/upload", json!({ "key": "a.json" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");

    let (status, _) = post(
        &h.app,
        "/etl/run",
        json!({ "key": "a.json", "content": "{}", "bucket": "Not_A_Bucket" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &h.app,
        "/etl/upload",
        json!({
            "key": "a.json",
            "content": "{}",
            "metadata": { "Pipeline-Output-Bucket": "sneaky" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn every_key_is_its_own_object() {
    let h = harness(false);

    for (key, content) in [
        ("orders", "parent"),
        ("orders/1.json", "child"),
        ("a/b.json", "one"),
        ("a//b.json", "two"),
    ] {
        let (status, _) = post(
            &h.app,
            "/etl/upload",
            json!({ "key": key, "content": content }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{key}");
    }

    for (key, content) in [
        ("orders", "parent"),
        ("orders/1.json", "child"),
        ("a/b.json", "one"),
        ("a//b.json", "two"),
    ] {
        let stored = h.store.get_object("etl-source-bucket", key).await.unwrap();
        assert_eq!(stored.content.as_ref(), content.as_bytes(), "{key}");
    }
}

#[tokio::test]
async fn unstorable_key_has_no_side_effects() {
    let h = harness(false);

    let (status, body) = post(
        &h.app,
        "/etl/upload",
        json!({ "key": "k".repeat(300), "content": "{}" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert!(!h.dir.path().join("etl-source-bucket").exists());
}

#[tokio::test]
async fn unknown_job_run_is_not_found() {
    let h = harness(false);

    let (status, body) = get(&h.app, "/etl/jobs/unknown-id").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}
