//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ControlPlane::start
//!     → listener.rs (bind host:port, serve until stop signal)
//!     → routing (RouteTable dispatch per request)
//!     → connection.rs (in-flight accounting, observer ids)
//! ```
//!
//! # Design Decisions
//! - One listener per start; a new start builds a new listener
//! - Stop signals the listener and returns without draining

pub mod connection;
pub mod listener;

pub use listener::{Listener, ListenerError};
