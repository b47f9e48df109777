//! Request recording for mock routes.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::broadcast::{BroadcastHub, BroadcastMessage};
use crate::control::state::{CapturedRequest, RequestLog, ServerState};
use crate::observability::metrics;

/// Appends captured requests to the bounded log and announces them.
///
/// Safe to call from any number of concurrently running handlers.
#[derive(Debug, Clone)]
pub struct RequestRecorder {
    state: Arc<RwLock<ServerState>>,
    hub: BroadcastHub,
}

impl RequestRecorder {
    pub fn new(state: Arc<RwLock<ServerState>>, hub: BroadcastHub) -> Self {
        Self { state, hub }
    }

    /// Store `captured` and publish a `new_request` event once the lock is released.
    pub async fn record(&self, captured: CapturedRequest) -> RequestLog {
        let (entry, evicted) = {
            let mut state = self.state.write().await;
            state.push_request(captured)
        };

        metrics::record_request_logged(&entry.method, evicted);
        tracing::debug!(
            id = entry.id,
            method = %entry.method,
            path = %entry.path,
            evicted,
            "Request recorded"
        );

        self.hub.publish(&BroadcastMessage::new_request(entry.clone()));
        entry
    }
}
