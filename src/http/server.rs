//! Control surface server setup.
//!
//! # Responsibilities
//! - Create the Axum router for the control API and the observer socket
//! - Wire up middleware (tracing, request ID, timeout)
//! - Serve until the process shutdown signal fires

use std::future::Future;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::control::ControlPlane;
use crate::http::handlers;
use crate::http::relay::{Relay, RelayError};
use crate::http::websocket;

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub plane: ControlPlane,
    pub relay: Relay,
    /// Bounded attempt for one observer write.
    pub write_timeout: Duration,
}

/// HTTP server for the control surface.
pub struct ControlServer {
    router: Router,
}

impl ControlServer {
    pub fn new(plane: ControlPlane, config: &AppConfig) -> Result<Self, RelayError> {
        let state = AppState {
            plane,
            relay: Relay::new(Duration::from_secs(config.relay.timeout_secs))?,
            write_timeout: Duration::from_millis(config.hub.write_timeout_ms),
        };
        let router = build_router(state, Duration::from_secs(config.control.request_timeout_secs));
        Ok(Self { router })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Control surface listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Control surface stopped");
        Ok(())
    }
}

/// Build the control router. The timeout covers `/api` only; `/ws` is long-lived.
#[allow(deprecated)]
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .route("/api/status", get(handlers::get_status))
        .route("/api/start", post(handlers::start))
        .route("/api/stop", post(handlers::stop))
        .route("/api/config", post(handlers::update_config))
        .route("/api/logs", get(handlers::get_logs))
        .route("/api/send", post(handlers::send))
        .route("/api/files", get(handlers::list_files))
        .route("/api/read-json", get(handlers::read_json))
        .route("/api/save-json", post(handlers::save_json))
        .route("/api/projects", get(handlers::list_projects).post(handlers::create_project))
        .route("/api/switch-project", post(handlers::switch_project))
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .merge(api)
        .route("/ws", get(websocket::subscribe))
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
