//! Mock HTTP endpoint server with a live observer feed.

// Core subsystems
pub mod broadcast;
pub mod config;
pub mod control;
pub mod http;
pub mod net;
pub mod project;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use broadcast::{BroadcastHub, BroadcastMessage, Subscription};
pub use config::AppConfig;
pub use control::{ControlError, ControlPlane, Lifecycle, RequestLog, StatusSnapshot};
pub use http::ControlServer;
pub use lifecycle::Shutdown;
pub use project::ProjectStore;
