//! Embedded mock listener: bind and serve.
//!
//! # Responsibilities
//! - Bind the configured host and port
//! - Serve a route table until its shutdown signal fires
//! - Report bind and serve failures to the control plane

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::control::state::ServerAddress;
use crate::lifecycle::shutdown;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind { address: String, source: std::io::Error },
    /// The accept loop failed after binding.
    Serve(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind { address, source } => write!(f, "failed to bind {}: {}", address, source),
            ListenerError::Serve(e) => write!(f, "listener failed: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind { source, .. } => Some(source),
            ListenerError::Serve(e) => Some(e),
        }
    }
}

/// A bound listener waiting to serve a route table.
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to `address`. Host names are resolved; IPv6 literals need no brackets.
    pub async fn bind(address: &ServerAddress) -> Result<Self, ListenerError> {
        let bind_err = |source| ListenerError::Bind {
            address: address.to_string(),
            source,
        };

        let inner = TcpListener::bind((address.ip.as_str(), address.port))
            .await
            .map_err(bind_err)?;
        let local_addr = inner.local_addr().map_err(bind_err)?;

        tracing::info!(address = %local_addr, "Mock listener bound");
        Ok(Self { inner, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve `app` until `stop` fires.
    ///
    /// Returning does not mean in-flight handlers finished; they keep running
    /// on their own tasks.
    pub async fn serve(self, app: Router, stop: broadcast::Receiver<()>) -> Result<(), ListenerError> {
        let addr = self.local_addr;
        axum::serve(self.inner, app)
            .with_graceful_shutdown(shutdown::wait(stop))
            .await
            .map_err(ListenerError::Serve)?;

        tracing::info!(address = %addr, "Mock listener stopped");
        Ok(())
    }
}
