//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the legacy `MAYBE_TIMEOUT` / `MAYBE_CANCEL` switches.
///
/// A non-empty value enables the matching simulation; unset or empty leaves
/// the configured value alone. Called once at startup.
pub fn apply_env_overrides(config: &mut GatewayConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides(config: &mut GatewayConfig, lookup: impl Fn(&str) -> Option<String>) {
    let enabled = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());

    if enabled("MAYBE_TIMEOUT") {
        config.simulation.maybe_timeout = true;
    }
    if enabled("MAYBE_CANCEL") {
        config.simulation.maybe_cancel = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn overrides_enable_simulations() {
        let env: HashMap<&str, &str> = [("MAYBE_TIMEOUT", "1"), ("MAYBE_CANCEL", "")].into();
        let mut config = GatewayConfig::default();

        apply_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert!(config.simulation.maybe_timeout);
        assert!(!config.simulation.maybe_cancel, "empty value must not enable");
    }

    #[test]
    fn load_rejects_invalid_file() {
        let path =
            std::env::temp_dir().join(format!("quote-gateway-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[simulation]\ntrigger_probability = 2.0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref v) if v.len() == 1));
        assert!(err.to_string().contains("trigger_probability"));

        fs::remove_file(path).ok();
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
