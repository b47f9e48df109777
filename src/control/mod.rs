//! Control plane subsystem.
//!
//! # Data Flow
//! ```text
//! Control surface (HTTP)
//!     → plane.rs (start / stop / update_config / switch_project)
//!     → state.rs (ServerState under one RwLock)
//!     → broadcast hub (status snapshots, after the lock is released)
//!
//! Mock listener request
//!     → recorder.rs (append to bounded log)
//!     → broadcast hub (new_request)
//! ```
//!
//! # Design Decisions
//! - Explicitly constructed and injected; there is no process-wide state
//! - Only start/stop misuse is reported to callers; everything else is
//!   recovered internally and surfaced as broadcasts

pub mod error;
pub mod plane;
pub mod recorder;
pub mod state;

pub use error::ControlError;
pub use plane::{Ack, ConfigUpdate, ControlPlane, PlaneSettings};
pub use recorder::RequestRecorder;
pub use state::{
    CapturedRequest, EndpointConfig, Lifecycle, RequestLog, SendBlock, ServerAddress, ServerState,
    StatusSnapshot, REQUEST_LOG_CAPACITY,
};
