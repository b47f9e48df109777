//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! mockdeck.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → CLI flags override individual fields
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Mock endpoints are project data, not application config

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, ControlConfig, HubConfig, MockConfig, ObservabilityConfig, ProjectsConfig, RelayConfig};
