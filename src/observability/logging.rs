//! Structured logging.
//!
//! # Design Decisions
//! - `tracing` everywhere, initialised once by the server binary
//! - `RUST_LOG` wins over the configured level
//! - JSON output when `observability.json_logs` is set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default directives when neither `RUST_LOG` nor config set a level.
pub const DEFAULT_DIRECTIVES: &str = "mockdeck=debug,tower_http=info";

/// Filter directives for the configured level, or the default when none is set.
pub fn directives(config: &ObservabilityConfig) -> String {
    let level = config.log_level.trim();
    if level.is_empty() {
        DEFAULT_DIRECTIVES.to_string()
    } else {
        format!("mockdeck={level},tower_http={level}")
    }
}

/// Build the env filter: `RUST_LOG` wins over [`directives`].
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(config)))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let registry = tracing_subscriber::registry().with(env_filter(config));
    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    }
}
