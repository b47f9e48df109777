//! Control plane errors.

use crate::project::ProjectError;

/// Errors surfaced synchronously to control plane callers.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("server is already running")]
    AlreadyRunning,

    #[error("server is not running")]
    NotRunning,

    #[error(transparent)]
    Project(#[from] ProjectError),
}
