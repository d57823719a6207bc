use std::{
    sync::{mpsc, Arc, Mutex},
    time::Duration,
};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use countup::{
    create_router, services::Autostart, AppState, EngineOptions, KeyValueStore, ManualClock,
    MemoryStore, PersistenceError,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    clock: ManualClock,
    store: Arc<MemoryStore>,
}

fn app_with(strict: bool, autostart: Option<Autostart>) -> TestApp {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 11, 28, 9, 0, 0).unwrap());
    let store = Arc::new(MemoryStore::new());
    let mut state = AppState::new(
        Arc::new(clock.clone()),
        Box::new(store.clone()),
        EngineOptions {
            strict,
            ..EngineOptions::default()
        },
    );
    if let Some(autostart) = autostart {
        state = state.with_autostart(autostart);
    }
    let state = Arc::new(state);

    TestApp {
        router: create_router(Arc::clone(&state)),
        state,
        clock,
        store,
    }
}

fn app() -> TestApp {
    app_with(false, None)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn post(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::POST, uri, None).await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None).await
}

#[tokio::test]
async fn status_of_fresh_stopwatch() {
    let app = app();

    let (status, body) = get(&app.router, "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stopwatch"]["phase"], json!("stopped"));
    assert_eq!(body["stopwatch"]["display"], json!("0:00"));
    assert_eq!(body["stopwatch"]["running_since"], Value::Null);
    assert_eq!(body["actions"], json!(["start"]));
    assert_eq!(body["ticker_active"], json!(false));
    assert_eq!(body["last_action"], Value::Null);
    assert_eq!(body["launch_at_login"], Value::Null);
}

#[tokio::test]
async fn start_pause_resume_reset_cycle() {
    let app = app();

    let (status, body) = post(&app.router, "/start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("applied"));
    assert_eq!(body["stopwatch"]["phase"], json!("running"));

    let (_, body) = get(&app.router, "/status").await;
    assert_eq!(body["actions"], json!(["pause", "reset"]));
    assert_eq!(body["ticker_active"], json!(true));
    assert_eq!(body["last_action"], json!("start"));

    app.clock.advance(Duration::from_secs(65));
    let (_, body) = post(&app.router, "/pause").await;
    assert_eq!(body["stopwatch"]["phase"], json!("paused"));
    assert_eq!(body["stopwatch"]["elapsed_seconds"], json!(65.0));
    assert_eq!(body["stopwatch"]["display"], json!("1:05"));

    let (_, body) = get(&app.router, "/status").await;
    assert_eq!(body["actions"], json!(["resume", "reset"]));
    assert_eq!(body["ticker_active"], json!(false));

    app.clock.advance(Duration::from_secs(30));
    post(&app.router, "/resume").await;
    app.clock.advance(Duration::from_secs(10));
    let (_, body) = get(&app.router, "/status").await;
    assert_eq!(body["stopwatch"]["accumulated_seconds"], json!(65.0));
    assert_eq!(body["stopwatch"]["elapsed_seconds"], json!(75.0));

    let (_, body) = post(&app.router, "/reset").await;
    assert_eq!(body["stopwatch"]["phase"], json!("stopped"));
    assert_eq!(body["stopwatch"]["accumulated_seconds"], json!(0.0));
    assert_eq!(app.store.get("phase").unwrap(), Some(json!("stopped")));
}

#[tokio::test]
async fn invalid_command_is_ignored_by_default() {
    let app = app();

    let (status, body) = post(&app.router, "/pause").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ignored"));
    assert_eq!(body["stopwatch"]["phase"], json!("stopped"));
    assert_eq!(app.store.get("phase").unwrap(), None);
}

#[tokio::test]
async fn invalid_command_conflicts_in_strict_mode() {
    let app = app_with(true, None);

    let (status, _) = post(&app.router, "/resume").await;
    assert_eq!(status, StatusCode::CONFLICT);

    post(&app.router, "/start").await;
    let (status, _) = post(&app.router, "/start").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post(&app.router, "/reset").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn quit_requests_shutdown() {
    let app = app();
    post(&app.router, "/start").await;

    let (status, body) = post(&app.router, "/quit").await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], json!("quitting"));
    tokio::time::timeout(Duration::from_secs(1), app.state.quit_requested())
        .await
        .expect("quit should be signalled");
}

/// Store whose writes block until the test lets them through
struct GatedStore {
    inner: MemoryStore,
    entered: Arc<tokio::sync::Notify>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl KeyValueStore for GatedStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        self.inner.get(key)
    }

    fn set_all(&self, entries: Vec<(String, Value)>) -> Result<(), PersistenceError> {
        self.entered.notify_one();
        // bounded so a blocked runtime thread still lets the test finish
        let _ = self
            .release
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(2));
        self.inner.set_all(entries)
    }
}

#[tokio::test]
async fn slow_save_does_not_block_other_requests() {
    let entered = Arc::new(tokio::sync::Notify::new());
    let (release_tx, release_rx) = mpsc::channel();
    let store = GatedStore {
        inner: MemoryStore::new(),
        entered: Arc::clone(&entered),
        release: Mutex::new(release_rx),
    };
    let state = Arc::new(AppState::new(
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 11, 28, 9, 0, 0).unwrap())),
        Box::new(store),
        EngineOptions::default(),
    ));
    let router = create_router(Arc::clone(&state));

    let start = tokio::spawn({
        let router = router.clone();
        async move { post(&router, "/start").await }
    });
    entered.notified().await;

    // the save is still held open while another request is served
    let (status, _) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!start.is_finished());

    release_tx.send(()).unwrap();
    let (status, body) = start.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stopwatch"]["phase"], json!("running"));
}

#[tokio::test]
async fn health_check() {
    let app = app();

    let (status, body) = get(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn launch_at_login_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(false, Some(Autostart::new(dir.path(), "/usr/bin/countup")));

    let (status, body) = get(&app.router, "/launch-at-login").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "enabled": false }));

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/launch-at-login",
        Some(json!({ "enabled": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "enabled": true }));
    assert!(dir.path().join("autostart").join("countup.desktop").is_file());

    let (_, body) = get(&app.router, "/status").await;
    assert_eq!(body["launch_at_login"], json!(true));
    // toggling has no effect on the stopwatch
    assert_eq!(body["stopwatch"]["phase"], json!("stopped"));

    let (_, body) = send(
        &app.router,
        Method::POST,
        "/launch-at-login",
        Some(json!({ "enabled": false })),
    )
    .await;
    assert_eq!(body, json!({ "enabled": false }));
}

#[tokio::test]
async fn launch_at_login_unavailable() {
    let app = app();

    let (status, _) = get(&app.router, "/launch-at-login").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
