//! Routing subsystem for the embedded mock listener.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at start):
//!     EndpointConfig[] snapshot
//!     → filter active, compile templates (matcher.rs)
//!     → freeze as RouteTable (router.rs)
//!
//! Incoming Request (any method, path)
//!     → handler.rs (fallback dispatch)
//!     → RouteTable::resolve
//!     → RequestRecorder, then response resolution
//! ```
//!
//! # Design Decisions
//! - Routes compiled per start, immutable while the listener runs
//! - Config changes apply on the next start, never hot-reloaded
//! - Unmatched paths are 404 and never recorded

pub mod handler;
pub mod matcher;
pub mod router;

pub use handler::{mock_router, MockContext, MockResponse};
pub use router::{MockRoute, RouteTable};
