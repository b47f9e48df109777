//! Broadcast subsystem.
//!
//! # Data Flow
//! ```text
//! ControlPlane / RequestRecorder
//!     → message.rs (BroadcastMessage envelope)
//!     → hub.rs (serialize once, try_send to each observer queue)
//!     → http/websocket.rs (per-observer writer with bounded write timeout)
//!     → observer socket
//! ```
//!
//! # Design Decisions
//! - At-most-once delivery per observer, no retry, no replay
//! - Independent lock domain from the server state

pub mod hub;
pub mod message;

pub use hub::{BroadcastHub, Subscription};
pub use message::BroadcastMessage;
