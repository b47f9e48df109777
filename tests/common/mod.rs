//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use mockdeck::config::AppConfig;
use mockdeck::control::{ConfigUpdate, ControlPlane, EndpointConfig, Lifecycle};
use mockdeck::http::{build_router, AppState, Relay};
use mockdeck::lifecycle::bootstrap;
use mockdeck::lifecycle::startup::build_plane;

/// A running control surface backed by a temporary projects root.
pub struct TestApp {
    pub dir: TempDir,
    pub plane: ControlPlane,
    pub base_url: String,
    pub mock_url: String,
}

fn test_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.projects.root = dir.path().display().to_string();
    config.hub.write_timeout_ms = 500;
    config.relay.timeout_secs = 5;
    config
}

/// Serve the control surface on `control_port`, with the mock listener
/// configured (not started) on `mock_port`.
pub async fn spawn_app(control_port: u16, mock_port: u16, endpoints: Vec<EndpointConfig>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.control.bind_address = format!("127.0.0.1:{control_port}");

    let boot = bootstrap(&config).await.unwrap();
    boot.plane
        .update_config(ConfigUpdate {
            ip: "127.0.0.1".into(),
            port: mock_port,
            endpoints,
            send_blocks: None,
        })
        .await;

    let plane = boot.plane.clone();
    tokio::spawn(boot.server.run(boot.listener, std::future::pending()));

    TestApp {
        dir,
        plane,
        base_url: format!("http://127.0.0.1:{control_port}"),
        mock_url: format!("http://127.0.0.1:{mock_port}"),
    }
}

/// Control router for `oneshot` tests; nothing is bound.
pub async fn control_router() -> (TempDir, ControlPlane, Router) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let plane = build_plane(&config).await.unwrap();
    let state = AppState {
        plane: plane.clone(),
        relay: Relay::new(Duration::from_secs(5)).unwrap(),
        write_timeout: Duration::from_millis(500),
    };
    (dir, plane, build_router(state, Duration::from_secs(10)))
}

pub async fn wait_for_lifecycle(plane: &ControlPlane, want: Lifecycle) {
    for _ in 0..200 {
        if plane.lifecycle().await == want {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("lifecycle never reached {want:?}");
}

pub async fn wait_for_observers(plane: &ControlPlane, want: usize) {
    for _ in 0..200 {
        if plane.hub().observer_count() == want {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("observer count never reached {want}");
}

/// Start a simple upstream that returns a fixed response.
pub async fn start_mock_backend(addr: SocketAddr, response: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nX-Backend: fixed\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}
