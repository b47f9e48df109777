//! Observer registry and best-effort fan-out.
//!
//! # Responsibilities
//! - Track the set of connected observers
//! - Serialize each message once and hand it to every observer's queue
//! - Drop observers whose queue is full or closed
//!
//! # Design Decisions
//! - Each observer owns a bounded mpsc queue; the socket writer drains it
//! - Publish never awaits a socket, so a slow observer cannot stall it
//! - A publish lock keeps per-observer order equal to publish order
//! - No backlog: observers only see messages published after they register

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::broadcast::message::BroadcastMessage;
use crate::net::connection::ConnectionId;
use crate::observability::metrics;

/// Default per-observer queue depth.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Fan-out hub shared by the control plane, the recorder and the observer endpoint.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    sinks: DashMap<ConnectionId, mpsc::Sender<Arc<str>>>,
    publish_lock: Mutex<()>,
    queue_depth: usize,
}

impl BroadcastHub {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                sinks: DashMap::new(),
                publish_lock: Mutex::new(()),
                queue_depth: queue_depth.max(1),
            }),
        }
    }

    /// Register a new observer. Dropping the returned subscription unregisters it.
    pub fn register(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.queue_depth);
        let id = ConnectionId::new();
        self.inner.sinks.insert(id, tx);
        metrics::record_observers(self.inner.sinks.len());
        tracing::debug!(observer = %id, observers = self.inner.sinks.len(), "Observer registered");

        Subscription {
            id,
            rx,
            hub: self.clone(),
        }
    }

    /// Remove an observer. Its queue closes, which ends its writer. Idempotent.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.inner.sinks.remove(&id).is_some();
        if removed {
            metrics::record_observers(self.inner.sinks.len());
            tracing::debug!(observer = %id, "Observer unregistered");
        }
        removed
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.sinks.len()
    }

    /// Deliver `message` to every registered observer.
    ///
    /// Returns the number of observers the message was queued for. Observers
    /// whose queue is full or closed are dropped and never retried.
    pub fn publish(&self, message: &BroadcastMessage) -> usize {
        let payload: Arc<str> = match serde_json::to_string(message) {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::error!(kind = message.kind(), error = %e, "Failed to serialize broadcast");
                return 0;
            }
        };

        let _guard = self
            .inner
            .publish_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut delivered = 0;
        let mut dropped = Vec::new();
        for sink in self.inner.sinks.iter() {
            match sink.value().try_send(Arc::clone(&payload)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(observer = %sink.key(), "Observer queue full, dropping observer");
                    dropped.push(*sink.key());
                }
                Err(TrySendError::Closed(_)) => dropped.push(*sink.key()),
            }
        }

        for id in &dropped {
            self.unregister(*id);
        }

        metrics::record_broadcast(message.kind(), dropped.len());
        tracing::trace!(kind = message.kind(), delivered, dropped = dropped.len(), "Broadcast published");
        delivered
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("observers", &self.inner.sinks.len())
            .field("queue_depth", &self.inner.queue_depth)
            .finish()
    }
}

/// A registered observer's receiving end.
pub struct Subscription {
    id: ConnectionId,
    rx: mpsc::Receiver<Arc<str>>,
    hub: BroadcastHub,
}

impl Subscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Next serialized message, or `None` once the hub dropped this observer.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unregister(self.id);
    }
}
