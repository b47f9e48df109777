//! Project collaborator: persisted config and response files.
//!
//! # Data Flow
//! ```text
//! ControlPlane::update_config / switch_project
//!     → store.rs (config.json read/write)
//! Mock handler
//!     → store.rs (response file bytes)
//! Control surface
//!     → store.rs (list/read/save response files, projects)
//! ```
//!
//! # Design Decisions
//! - Plain files, no caching: edits on disk are picked up on the next request
//! - Every name is validated before touching the filesystem

pub mod names;
pub mod store;

pub use store::{ProjectConfig, ProjectInfo, ProjectStore};

/// Errors from the project collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("project {0} already exists")]
    AlreadyExists(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
