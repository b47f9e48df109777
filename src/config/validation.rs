//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::AppConfig;
use crate::project::names::validate_name;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.control.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "control.bind_address",
            format!("not a socket address: {:?}", config.control.bind_address),
        ));
    }
    if config.control.request_timeout_secs == 0 {
        errors.push(ValidationError::new("control.request_timeout_secs", "must be > 0"));
    }
    if config.projects.root.trim().is_empty() {
        errors.push(ValidationError::new("projects.root", "must not be empty"));
    }
    if validate_name(&config.projects.default_project).is_err() {
        errors.push(ValidationError::new(
            "projects.default_project",
            format!("invalid project name: {:?}", config.projects.default_project),
        ));
    }
    if config.mock.max_body_bytes == 0 {
        errors.push(ValidationError::new("mock.max_body_bytes", "must be > 0"));
    }
    if config.hub.queue_depth == 0 {
        errors.push(ValidationError::new("hub.queue_depth", "must be > 0"));
    }
    if config.hub.write_timeout_ms == 0 {
        errors.push(ValidationError::new("hub.write_timeout_ms", "must be > 0"));
    }
    if config.relay.timeout_secs == 0 {
        errors.push(ValidationError::new("relay.timeout_secs", "must be > 0"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = AppConfig::default();
        config.control.bind_address = "nope".into();
        config.projects.default_project = "../x".into();
        config.hub.queue_depth = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["control.bind_address", "projects.default_project", "hub.queue_depth"]
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "bad".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
