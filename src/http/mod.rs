//! Control surface subsystem.
//!
//! # Data Flow
//! ```text
//! Front end
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → handlers.rs (JSON in, ControlPlane / ProjectStore call, JSON out)
//!     → error.rs (failures as {"error": ...})
//!
//! Observer
//!     → websocket.rs (register with the hub, forward broadcasts)
//! ```

pub mod error;
pub mod handlers;
pub mod relay;
pub mod server;
pub mod websocket;

pub use error::ApiError;
pub use relay::{Relay, RelayError, RelayRequest, RelayResponse};
pub use server::{build_router, AppState, ControlServer};
