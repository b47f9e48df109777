//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Open project store → Load default project → Build control plane → Bind control surface
//!
//! Shutdown (shutdown.rs):
//!     One-shot stop signal per mock listener start
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop the control surface, then any running mock listener
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, Bootstrap, StartupError};
