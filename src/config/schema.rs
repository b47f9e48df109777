//! Application configuration schema.
//!
//! This is the config of the mockdeck process itself. The mock endpoints
//! live in per-project JSON files handled by the project store.

use serde::{Deserialize, Serialize};

use crate::broadcast::hub::DEFAULT_QUEUE_DEPTH;
use crate::control::plane::DEFAULT_MAX_BODY_BYTES;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Control surface listener.
    pub control: ControlConfig,

    /// Project storage.
    pub projects: ProjectsConfig,

    /// Embedded mock listener limits.
    pub mock: MockConfig,

    /// Observer fan-out.
    pub hub: HubConfig,

    /// Outbound pass-through requests.
    pub relay: RelayConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Control surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Timeout for control API requests in seconds. Does not apply to `/ws`.
    pub request_timeout_secs: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectsConfig {
    /// Directory holding one sub-directory per project.
    pub root: String,

    /// Project loaded at startup.
    pub default_project: String,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            root: "projects".to_string(),
            default_project: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockConfig {
    /// Largest request body captured by mock routes, in bytes.
    pub max_body_bytes: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HubConfig {
    /// Messages buffered per observer before it is dropped as too slow.
    pub queue_depth: usize,

    /// Bounded attempt for one websocket write, in milliseconds.
    pub write_timeout_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_depth: DEFAULT_QUEUE_DEPTH,
            write_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Total timeout for an outbound request in seconds.
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). Empty uses the built-in directives.
    pub log_level: String,

    /// Emit JSON log lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: String::new(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
