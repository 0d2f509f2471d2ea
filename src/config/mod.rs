//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML)
//!     → env.rs (expand $VAR / ${VAR})
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Config (validated, immutable)
//!     → owned by AppContext, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - Everything except the environment and the HTTP port has a default
//! - Validation separates syntactic (serde) from semantic checks
//! - Any loading error is fatal before a listener binds

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError, DEFAULT_CONFIG_PATH};
pub use schema::{
    Config, Environment, FileOutputConfig, LogLevel, LoggingConfig, ObservabilityConfig,
    ProxyConfig, RotationPolicy, StaticHostConfig,
};
pub use validation::ValidationError;
