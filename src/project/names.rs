//! File and project name validation.

use crate::project::ProjectError;

/// Reject names that could escape their directory.
pub fn validate_name(name: &str) -> Result<(), ProjectError> {
    if name.trim().is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(ProjectError::InvalidName(name.to_string()));
    }
    Ok(())
}
