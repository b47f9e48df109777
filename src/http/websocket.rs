//! Observer connections.
//!
//! # Responsibilities
//! - Register an observer with the broadcast hub on upgrade
//! - Forward queued broadcast payloads as text frames
//! - Unregister on close, failed write or write timeout
//!
//! # Data Flow
//! ```text
//! BroadcastHub ──try_send──→ observer queue ──writer──→ WebSocket ──→ front end
//!                                          ←─reader── (drained, ignored)
//! ```
//!
//! # Design Decisions
//! - Registration happens before the upgrade completes, so a client that
//!   has finished the handshake never misses a later broadcast
//! - Each write is bounded by a timeout; a stalled socket is dropped
//! - Inbound frames are only read to notice the close

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};

use crate::broadcast::Subscription;
use crate::http::server::AppState;

pub async fn subscribe(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let subscription = state.plane.subscribe();
    let write_timeout = state.write_timeout;
    tracing::info!(observer = %subscription.id(), "Observer connecting");
    ws.on_upgrade(move |socket| observe(socket, subscription, write_timeout))
}

async fn observe(socket: WebSocket, mut subscription: Subscription, write_timeout: Duration) {
    let observer = subscription.id();
    let (mut sink, mut stream) = socket.split();

    let mut reader = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            payload = subscription.recv() => {
                let Some(payload) = payload else {
                    tracing::debug!(observer = %observer, "Observer dropped by hub");
                    break;
                };
                let frame = Message::Text(payload.to_string().into());
                match tokio::time::timeout(write_timeout, sink.send(frame)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(observer = %observer, error = %e, "Observer write failed");
                        break;
                    }
                    Err(_) => {
                        tracing::warn!(observer = %observer, timeout = ?write_timeout, "Observer write timed out");
                        break;
                    }
                }
            }
            _ = &mut reader => break,
        }
    }

    reader.abort();
    drop(subscription);
    let _ = tokio::time::timeout(write_timeout, sink.close()).await;
    tracing::info!(observer = %observer, "Observer disconnected");
}
