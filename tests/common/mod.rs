use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use retail_crm_api::{
    app_router,
    config::AppConfig,
    db,
    events::{self},
    AppState,
};

/// Helper harness backed by a throwaway SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    db_path: std::path::PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Constructs a fresh application with its own database and schema.
    pub async fn new() -> Self {
        // A unique on-disk database per harness; in-memory SQLite vanishes
        // when the pool recycles its connection.
        let db_path = std::env::temp_dir().join(format!(
            "retail_crm_test_{}.db",
            uuid::Uuid::new_v4().simple()
        ));
        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.notifier.console_only = true;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), &cfg, Arc::new(event_sender));
        let router = app_router(state.clone());
        let token = state
            .auth
            .issue_token("staff@example.com")
            .expect("issue test token");

        Self {
            router,
            state,
            token,
            db_path,
            _event_task: event_task,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Sends a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        // Best-effort removal of the database and its sqlite sidecar files.
        let _ = std::fs::remove_file(&self.db_path);
        for suffix in ["-wal", "-shm", "-journal"] {
            let mut sidecar = self.db_path.clone().into_os_string();
            sidecar.push(suffix);
            let _ = std::fs::remove_file(sidecar);
        }
    }
}

/// Reads a response body as JSON, asserting the expected status first.
pub async fn json_body(response: Response, expected: StatusCode) -> Value {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect response body")
        .to_bytes();
    assert_eq!(
        status,
        expected,
        "unexpected status; body: {}",
        String::from_utf8_lossy(&bytes)
    );
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not valid json")
    }
}
