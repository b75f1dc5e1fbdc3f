//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (MAYBE_TIMEOUT / MAYBE_CANCEL overrides, once)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to the pipeline constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; nothing reads the environment later
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    DownstreamConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, QuoteConfig,
    SimulationConfig, TimingConfig,
};
pub use validation::{validate_config, ValidationError};
