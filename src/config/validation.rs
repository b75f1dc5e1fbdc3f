//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (probabilities, timeouts)
//! - Check addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address `{value}`")]
    Address { field: &'static str, value: String },

    #[error("simulation.trigger_probability must be within 0..=1, got {0}")]
    Probability(f64),

    #[error("simulation.inner_timeout_ms must be greater than zero")]
    ZeroInnerTimeout,

    #[error("timing.service_names must not be empty")]
    NoServiceNames,

    #[error("quote.sentinel must not be empty")]
    EmptySentinel,

    #[error("downstream.path must start with '/', got `{0}`")]
    RelativePath(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.downstream.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "downstream.address",
            value: config.downstream.address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::Address {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let p = config.simulation.trigger_probability;
    if !(0.0..=1.0).contains(&p) {
        errors.push(ValidationError::Probability(p));
    }
    if config.simulation.inner_timeout_ms == 0 {
        errors.push(ValidationError::ZeroInnerTimeout);
    }
    if config.timing.service_names.is_empty() {
        errors.push(ValidationError::NoServiceNames);
    }
    if config.quote.sentinel.is_empty() {
        errors.push(ValidationError::EmptySentinel);
    }
    if !config.downstream.path.starts_with('/') {
        errors.push(ValidationError::RelativePath(config.downstream.path.clone()));
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
    fn default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.simulation.trigger_probability = 1.5;
        config.simulation.inner_timeout_ms = 0;
        config.timing.service_names.clear();
        config.downstream.address = "not-an-address".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Probability(1.5)));
        assert!(errors.contains(&ValidationError::NoServiceNames));
    }

    #[test]
    fn relative_downstream_path_rejected() {
        let mut config = GatewayConfig::default();
        config.downstream.path = "services/quote".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::RelativePath("services/quote".into())]);
    }
}
