//! Listener lifecycle and configuration owner.
//!
//! # Responsibilities
//! - Start and stop the embedded mock listener
//! - Replace address and endpoints, persisting them through the project store
//! - Switch the active project
//! - Publish a status snapshot after every state transition
//!
//! # Design Decisions
//! - Start marks the state `Starting` under the lock before any I/O, so a
//!   second start fails fast; the listener task confirms or rolls back
//! - Every start bumps an epoch; results from an older listener are ignored
//! - The state lock is always released before publishing
//! - Stop signals the listener and returns; in-flight handlers finish on their own
//! - A start binds only after the previously stopped listener released its socket

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot, RwLock};

use crate::broadcast::{BroadcastHub, BroadcastMessage, Subscription};
use crate::control::error::ControlError;
use crate::control::recorder::RequestRecorder;
use crate::control::state::{
    EndpointConfig, Lifecycle, ListenerHandle, RequestLog, SendBlock, ServerAddress, ServerState,
    StatusSnapshot,
};
use crate::lifecycle::shutdown::Shutdown;
use crate::net::connection::InFlightTracker;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;
use crate::project::{ProjectConfig, ProjectStore};
use crate::routing::{mock_router, MockContext, RouteTable};

/// Default cap on captured request bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Longest a start waits for the previous listener to close before binding anyway.
const LISTENER_RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

/// Acknowledgement returned by successful control operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Replacement configuration accepted by [`ControlPlane::update_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub ip: String,
    #[serde(deserialize_with = "crate::control::state::port_from_number_or_string")]
    pub port: u16,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
    /// `None` keeps the current send blocks.
    #[serde(default)]
    pub send_blocks: Option<Vec<SendBlock>>,
}

/// Tunables for listeners started by the control plane.
#[derive(Debug, Clone)]
pub struct PlaneSettings {
    pub max_body_bytes: usize,
}

impl Default for PlaneSettings {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// The single actor allowed to change server state outside request handling.
///
/// Cheap to clone; all clones share one state.
#[derive(Debug, Clone)]
pub struct ControlPlane {
    inner: Arc<PlaneInner>,
}

#[derive(Debug)]
struct PlaneInner {
    state: Arc<RwLock<ServerState>>,
    hub: BroadcastHub,
    recorder: RequestRecorder,
    store: ProjectStore,
    in_flight: InFlightTracker,
    settings: PlaneSettings,
}

impl ControlPlane {
    /// Build a stopped control plane from a project's persisted config.
    pub fn new(
        project: impl Into<String>,
        config: ProjectConfig,
        store: ProjectStore,
        hub: BroadcastHub,
        settings: PlaneSettings,
    ) -> Self {
        let mut state = ServerState::new(config.address(), config.endpoints, project);
        state.send_blocks = config.send_blocks;

        let state = Arc::new(RwLock::new(state));
        let recorder = RequestRecorder::new(state.clone(), hub.clone());

        Self {
            inner: Arc::new(PlaneInner {
                state,
                hub,
                recorder,
                store,
                in_flight: InFlightTracker::new(),
                settings,
            }),
        }
    }

    /// Read-only snapshot of the current state.
    pub async fn state(&self) -> StatusSnapshot {
        self.inner.state.read().await.snapshot()
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.inner.state.read().await.lifecycle()
    }

    /// The retained request log, oldest first.
    pub async fn recent_requests(&self) -> Vec<RequestLog> {
        self.inner.state.read().await.request_log().cloned().collect()
    }

    pub async fn current_project(&self) -> String {
        self.inner.state.read().await.current_project().to_string()
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.inner.hub
    }

    pub fn store(&self) -> &ProjectStore {
        &self.inner.store
    }

    /// Open an observer subscription on the broadcast stream.
    pub fn subscribe(&self) -> Subscription {
        self.inner.hub.register()
    }

    /// Start the mock listener with a snapshot of the current endpoints.
    ///
    /// Returns as soon as the state is `Starting`; binding happens on a
    /// background task which later confirms `Running` or rolls back.
    pub async fn start(&self) -> Result<Ack, ControlError> {
        let (epoch, address, table, stop, previous, released, snapshot) = {
            let mut state = self.inner.state.write().await;
            if state.is_running() {
                return Err(ControlError::AlreadyRunning);
            }

            state.lifecycle = Lifecycle::Starting;
            state.epoch += 1;
            let epoch = state.epoch;

            let shutdown = Shutdown::new();
            let stop = shutdown.subscribe();
            let (released, released_rx) = oneshot::channel();
            state.listener = Some(ListenerHandle {
                epoch,
                shutdown,
                released: released_rx,
            });
            let previous = state.previous_release.take();

            let table = RouteTable::build(&state.endpoints, state.current_project.clone());
            (epoch, state.address.clone(), table, stop, previous, released, state.snapshot())
        };

        metrics::record_transition(Lifecycle::Starting.as_str());
        tracing::info!(epoch, address = %address, routes = table.len(), "Mock server starting");
        if table.is_empty() {
            tracing::warn!(epoch, "No active endpoints, every request will get 404");
        }

        self.inner.hub.publish(&BroadcastMessage::status(snapshot));

        let plane = self.clone();
        tokio::spawn(async move {
            plane.run_listener(epoch, address, table, stop, previous, released).await;
        });

        Ok(Ack::new("server starting"))
    }

    /// Stop the mock listener without waiting for in-flight requests.
    pub async fn stop(&self) -> Result<Ack, ControlError> {
        let (handle, snapshot) = {
            let mut state = self.inner.state.write().await;
            if !state.is_running() {
                return Err(ControlError::NotRunning);
            }
            state.lifecycle = Lifecycle::Stopped;
            let handle = match state.listener.take() {
                Some(ListenerHandle {
                    epoch,
                    shutdown,
                    released,
                }) => {
                    state.previous_release = Some(released);
                    Some((epoch, shutdown))
                }
                None => None,
            };
            (handle, state.snapshot())
        };

        if let Some((epoch, shutdown)) = handle {
            shutdown.trigger();
            tracing::info!(
                epoch,
                in_flight = self.inner.in_flight.active_count(),
                "Mock server stopped"
            );
        }
        metrics::record_transition(Lifecycle::Stopped.as_str());

        self.inner.hub.publish(&BroadcastMessage::status(snapshot));
        Ok(Ack::new("server stopped"))
    }

    /// Replace address and endpoints.
    ///
    /// A running listener keeps serving its original routes until the next
    /// start. Persisting is best effort: failures are logged, never returned.
    pub async fn update_config(&self, update: ConfigUpdate) -> Ack {
        let (project, persisted, snapshot) = {
            let mut state = self.inner.state.write().await;
            state.address = ServerAddress::new(update.ip, update.port);
            state.endpoints = update.endpoints;
            if let Some(blocks) = update.send_blocks {
                state.send_blocks = blocks;
            }

            let persisted = ProjectConfig {
                ip: state.address.ip.clone(),
                port: state.address.port,
                endpoints: state.endpoints.clone(),
                send_blocks: state.send_blocks.clone(),
            };
            (state.current_project.clone(), persisted, state.snapshot())
        };

        tracing::info!(
            project = %project,
            address = %persisted.address(),
            endpoints = persisted.endpoints.len(),
            "Configuration updated"
        );

        if let Err(e) = self.inner.store.save_config(&project, &persisted).await {
            tracing::warn!(project = %project, error = %e, "Failed to persist configuration");
        }

        self.inner.hub.publish(&BroadcastMessage::status(snapshot));
        Ack::new("configuration updated")
    }

    /// Load another project's config into the live state.
    pub async fn switch_project(&self, project: &str) -> Result<Ack, ControlError> {
        let config = self.inner.store.load_config(project).await?;

        let snapshot = {
            let mut state = self.inner.state.write().await;
            state.address = config.address();
            state.endpoints = config.endpoints;
            state.send_blocks = config.send_blocks;
            state.current_project = project.to_string();
            state.snapshot()
        };

        tracing::info!(project, "Switched project");
        self.inner.hub.publish(&BroadcastMessage::status(snapshot));
        Ok(Ack::new(format!("switched to project {project}")))
    }

    /// Stop the listener if one is running and wait for its socket to close.
    /// Used on process exit.
    pub async fn shutdown(&self) {
        match self.stop().await {
            Ok(_) | Err(ControlError::NotRunning) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to stop mock server on shutdown"),
        }

        let pending = self.inner.state.write().await.previous_release.take();
        if let Some(released) = pending {
            if tokio::time::timeout(LISTENER_RELEASE_TIMEOUT, released).await.is_err() {
                tracing::warn!("Mock listener still open at shutdown");
            }
        }
    }

    async fn run_listener(
        self,
        epoch: u64,
        address: ServerAddress,
        table: RouteTable,
        stop: broadcast::Receiver<()>,
        previous: Option<oneshot::Receiver<()>>,
        _released: oneshot::Sender<()>,
    ) {
        if let Some(previous) = previous {
            if tokio::time::timeout(LISTENER_RELEASE_TIMEOUT, previous).await.is_err() {
                tracing::warn!(epoch, "Previous listener still open, binding anyway");
            }
        }

        let listener = match Listener::bind(&address).await {
            Ok(listener) => listener,
            Err(e) => {
                self.roll_back(epoch, e).await;
                return;
            }
        };

        if !self.confirm_running(epoch).await {
            tracing::debug!(epoch, "Listener superseded before bind completed");
            return;
        }

        let app = mock_router(MockContext {
            routes: Arc::new(table),
            recorder: self.inner.recorder.clone(),
            store: self.inner.store.clone(),
            in_flight: self.inner.in_flight.clone(),
            max_body_bytes: self.inner.settings.max_body_bytes,
        });

        if let Err(e) = listener.serve(app, stop).await {
            self.roll_back(epoch, e).await;
        }
    }

    /// `Starting → Running` if `epoch` is still the current start.
    async fn confirm_running(&self, epoch: u64) -> bool {
        let snapshot = {
            let mut state = self.inner.state.write().await;
            if state.epoch != epoch || state.lifecycle != Lifecycle::Starting {
                return false;
            }
            state.lifecycle = Lifecycle::Running;
            state.snapshot()
        };

        metrics::record_transition(Lifecycle::Running.as_str());
        tracing::info!(epoch, address = %format!("{}:{}", snapshot.ip, snapshot.port), "Mock server running");
        self.inner.hub.publish(&BroadcastMessage::status(snapshot));
        true
    }

    /// Roll back to `Stopped` after a listener failure, then announce it.
    async fn roll_back(&self, epoch: u64, error: ListenerError) {
        let snapshot = {
            let mut state = self.inner.state.write().await;
            if state.epoch != epoch || !state.is_running() {
                tracing::debug!(epoch, error = %error, "Ignoring failure from stale listener");
                return;
            }
            state.lifecycle = Lifecycle::Stopped;
            state.listener = None;
            state.snapshot()
        };

        metrics::record_transition(Lifecycle::Stopped.as_str());
        tracing::error!(epoch, error = %error, "Mock server failed");

        self.inner.hub.publish(&BroadcastMessage::server_error(error.to_string()));
        self.inner.hub.publish(&BroadcastMessage::status(snapshot));
    }
}
