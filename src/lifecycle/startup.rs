//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the project store and load the default project
//! - Build the control plane and control surface
//! - Bind the control listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The mock listener is never started automatically

use tokio::net::TcpListener;

use crate::broadcast::BroadcastHub;
use crate::config::AppConfig;
use crate::control::{ControlPlane, PlaneSettings};
use crate::http::{ControlServer, RelayError};
use crate::project::{ProjectError, ProjectStore};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("project store: {0}")]
    Project(#[from] ProjectError),

    #[error("relay client: {0}")]
    Relay(#[from] RelayError),

    #[error("failed to bind control surface {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the server binary runs.
pub struct Bootstrap {
    pub plane: ControlPlane,
    pub server: ControlServer,
    pub listener: TcpListener,
}

/// Build a stopped control plane for the configured default project.
pub async fn build_plane(config: &AppConfig) -> Result<ControlPlane, ProjectError> {
    let default_project = &config.projects.default_project;
    let store = ProjectStore::open(&config.projects.root, default_project).await?;
    let project_config = store.load_config(default_project).await?;

    tracing::info!(
        root = %store.root().display(),
        project = %default_project,
        address = %project_config.address(),
        endpoints = project_config.endpoints.len(),
        "Project loaded"
    );

    Ok(ControlPlane::new(
        default_project.clone(),
        project_config,
        store,
        BroadcastHub::new(config.hub.queue_depth),
        PlaneSettings {
            max_body_bytes: config.mock.max_body_bytes,
        },
    ))
}

pub async fn bootstrap(config: &AppConfig) -> Result<Bootstrap, StartupError> {
    let plane = build_plane(config).await?;
    let server = ControlServer::new(plane.clone(), config)?;

    let address = config.control.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    Ok(Bootstrap {
        plane,
        server,
        listener,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_seeds_default_project() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.projects.root = dir.path().display().to_string();
        config.control.bind_address = "127.0.0.1:0".into();

        let boot = bootstrap(&config).await.unwrap();
        let status = boot.plane.state().await;
        assert_eq!(status.current_project, "default");
        assert!(!status.is_running);
        assert!(dir.path().join("default").join("json_files").join("success_response.json").exists());
    }

    #[tokio::test]
    async fn occupied_control_address_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = AppConfig::default();
        config.projects.root = dir.path().display().to_string();
        config.control.bind_address = blocker.local_addr().unwrap().to_string();

        assert!(matches!(bootstrap(&config).await, Err(StartupError::Bind { .. })));
    }
}
