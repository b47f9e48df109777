//! Mock endpoint handler.
//!
//! # Responsibilities
//! - Capture method, headers and raw body of requests on registered routes
//! - Hand the capture to the recorder
//! - Answer from the route's response file, or the default acknowledgement
//!
//! # Design Decisions
//! - One fallback handler dispatches through the RouteTable, so any method matches
//! - Response file failures fall back silently to the acknowledgement
//! - Non-JSON response files are returned verbatim as text
//! - Bodies over `max_body_bytes` are answered with 413 and never recorded

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::control::recorder::RequestRecorder;
use crate::control::state::CapturedRequest;
use crate::net::connection::InFlightTracker;
use crate::project::ProjectStore;
use crate::routing::router::{MockRoute, RouteTable};

/// `message` field of the default acknowledgement.
pub const DEFAULT_MESSAGE: &str = "default response";

/// Everything a mock handler needs, cloned into each request.
#[derive(Debug, Clone)]
pub struct MockContext {
    pub routes: Arc<RouteTable>,
    pub recorder: RequestRecorder,
    pub store: ProjectStore,
    pub in_flight: InFlightTracker,
    pub max_body_bytes: usize,
}

/// Build the axum app served by one listener instance.
pub fn mock_router(ctx: MockContext) -> Router {
    let body_limit = ctx.max_body_bytes;
    Router::new()
        .fallback(serve_mock)
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

/// Resolved body for a mock response.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    Default,
    Json(Value),
    Raw(Vec<u8>),
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        match self {
            MockResponse::Default => Json(default_ack()).into_response(),
            MockResponse::Json(value) => Json(value).into_response(),
            MockResponse::Raw(bytes) => (
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                bytes,
            )
                .into_response(),
        }
    }
}

/// `{"message", "timestamp"}` with the current server time.
pub fn default_ack() -> Value {
    json!({
        "message": DEFAULT_MESSAGE,
        "timestamp": Utc::now(),
    })
}

/// Resolve the response for `route`. Never fails.
pub async fn resolve_response(store: &ProjectStore, project: &str, route: &MockRoute) -> MockResponse {
    let Some(file) = route.response_file.as_deref() else {
        return MockResponse::Default;
    };

    match store.response_file(project, file).await {
        Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => MockResponse::Json(value),
            Err(_) => MockResponse::Raw(bytes),
        },
        Err(e) => {
            tracing::debug!(file, project, error = %e, "Response file unavailable, using default");
            MockResponse::Default
        }
    }
}

async fn serve_mock(
    State(ctx): State<MockContext>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let path = uri.path();
    let Some(route) = ctx.routes.resolve(path).cloned() else {
        tracing::debug!(path = %path, "No mock route matched");
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    let _in_flight = ctx.in_flight.track();
    let body = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            tracing::warn!(
                path = %path,
                status = %rejection.status(),
                limit = ctx.max_body_bytes,
                error = %rejection.body_text(),
                "Request body rejected, not recorded"
            );
            return rejection.into_response();
        }
    };

    ctx.recorder
        .record(CapturedRequest {
            path: route.path().to_string(),
            method: method.to_string(),
            headers: collect_headers(&headers),
            body: String::from_utf8_lossy(&body).into_owned(),
        })
        .await;

    resolve_response(&ctx.store, ctx.routes.project(), &route)
        .await
        .into_response()
}

/// Multi-valued header map keyed by lower-case name.
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        let value = match value.to_str() {
            Ok(v) => v.to_string(),
            Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
        };
        out.entry(name.as_str().to_string()).or_default().push(value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use crate::broadcast::BroadcastHub;
    use crate::control::state::{EndpointConfig, ServerAddress, ServerState};
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    struct Fixture {
        _dir: tempfile::TempDir,
        state: Arc<RwLock<ServerState>>,
        app: Router,
    }

    async fn fixture(endpoints: Vec<EndpointConfig>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path(), "default").await.unwrap();
        store.save_file("default", "user.json", r#"{"user":"alice"}"#).await.unwrap();
        tokio::fs::write(dir.path().join("default/json_files/plain.json"), "not json at all")
            .await
            .unwrap();

        let state = Arc::new(RwLock::new(ServerState::new(
            ServerAddress::new("127.0.0.1", 0),
            endpoints.clone(),
            "default",
        )));
        let ctx = MockContext {
            routes: Arc::new(RouteTable::build(&endpoints, "default")),
            recorder: RequestRecorder::new(state.clone(), BroadcastHub::default()),
            store,
            in_flight: InFlightTracker::new(),
            max_body_bytes: 1024 * 1024,
        };

        Fixture {
            _dir: dir,
            state,
            app: mock_router(ctx),
        }
    }

    async fn send(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn echo_records_and_acknowledges() {
        let fx = fixture(vec![EndpointConfig::new("echo", "/api/echo")]).await;

        let (status, body) = send(&fx.app, "POST", "/api/echo", r#"{"a":1}"#).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], DEFAULT_MESSAGE);
        assert!(json["timestamp"].is_string());

        let state = fx.state.read().await;
        let entry = state.request_log().next().unwrap();
        assert_eq!(entry.method, "POST");
        assert_eq!(entry.path, "/api/echo");
        assert_eq!(entry.body, r#"{"a":1}"#);
        assert_eq!(entry.headers["content-type"], vec!["application/json"]);
    }

    #[tokio::test]
    async fn every_method_hits_the_same_route() {
        let fx = fixture(vec![EndpointConfig::new("echo", "/api/echo")]).await;
        for method in ["GET", "PUT", "DELETE", "PATCH"] {
            let (status, _) = send(&fx.app, method, "/api/echo", "").await;
            assert_eq!(status, StatusCode::OK);
        }
        let methods: Vec<String> = fx.state.read().await.request_log().map(|e| e.method.clone()).collect();
        assert_eq!(methods, vec!["GET", "PUT", "DELETE", "PATCH"]);
    }

    #[tokio::test]
    async fn inactive_route_neither_records_nor_answers() {
        let fx = fixture(vec![EndpointConfig::new("off", "/api/off").inactive()]).await;
        let (status, _) = send(&fx.app, "GET", "/api/off", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(fx.state.read().await.request_log().len(), 0);
    }

    #[tokio::test]
    async fn response_file_variants() {
        let fx = fixture(vec![
            EndpointConfig::new("json", "/json").with_response_file("user.json"),
            EndpointConfig::new("raw", "/raw").with_response_file("plain.json"),
            EndpointConfig::new("missing", "/missing").with_response_file("gone.json"),
        ])
        .await;

        let (_, body) = send(&fx.app, "GET", "/json", "").await;
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"user": "alice"}));

        let (_, body) = send(&fx.app, "GET", "/raw", "").await;
        assert_eq!(body, b"not json at all");

        let (status, body) = send(&fx.app, "GET", "/missing", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap()["message"], DEFAULT_MESSAGE);
    }

    #[tokio::test]
    async fn oversized_body_is_413_and_unrecorded() {
        let fx = fixture(vec![EndpointConfig::new("echo", "/api/echo")]).await;
        let big = "x".repeat(1024 * 1024 + 1);

        let (status, _) = send(&fx.app, "POST", "/api/echo", &big).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(fx.state.read().await.request_log().len(), 0);

        let at_limit = "y".repeat(1024 * 1024);
        let (status, _) = send(&fx.app, "POST", "/api/echo", &at_limit).await;
        assert_eq!(status, StatusCode::OK);
        let state = fx.state.read().await;
        assert_eq!(state.request_log().next().unwrap().body.len(), 1024 * 1024);
    }

    #[test]
    fn headers_keep_every_value() {
        let mut headers = HeaderMap::new();
        headers.append("x-tag", "a".parse().unwrap());
        headers.append("x-tag", "b".parse().unwrap());
        let collected = collect_headers(&headers);
        assert_eq!(collected["x-tag"], vec!["a", "b"]);
    }
}
