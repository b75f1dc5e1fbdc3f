//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the quote gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The legacy quote service the gateway translates for.
    pub downstream: DownstreamConfig,

    /// Flaky-backend simulation knobs.
    pub simulation: SimulationConfig,

    /// Timer naming.
    pub timing: TimingConfig,

    /// Quote endpoint behaviour.
    pub quote: QuoteConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Downstream SOAP service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Backend address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Fixed endpoint path every quote request is rewritten to.
    pub path: String,

    /// Service name the downstream call is timed under.
    pub service_name: String,

    /// Largest downstream body the recorder will capture.
    pub max_body_bytes: usize,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
            path: "/services/quote/getquote".to_string(),
            service_name: "QuoteSoapService".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Simulated timeout/cancellation of the downstream call.
///
/// Both switches are demo knobs. They are read once at startup (config file
/// or `MAYBE_TIMEOUT` / `MAYBE_CANCEL`) and handed to the pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Sometimes give the downstream call a short inner deadline.
    pub maybe_timeout: bool,

    /// Sometimes cancel the downstream call while it is in flight.
    pub maybe_cancel: bool,

    /// Probability that an enabled simulation fires on a given request.
    pub trigger_probability: f64,

    /// Inner deadline applied when the timeout simulation fires.
    pub inner_timeout_ms: u64,

    /// Upper bound of the random post-call delay (0 disables it).
    pub max_delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            maybe_timeout: false,
            maybe_cancel: false,
            trigger_probability: 0.25,
            inner_timeout_ms: 100,
            max_delay_ms: 100,
        }
    }
}

/// Timer naming.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Display labels; one is picked per request as `<label>-quote`.
    pub service_names: Vec<String>,

    /// Name of the contributor that covers the quote operation.
    pub contributor: String,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            service_names: [
                "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "india", "hotel",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            contributor: "QuoteSvc.GetTradePrice".to_string(),
        }
    }
}

/// Quote endpoint behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Symbol the backend refuses to price; requesting it is a fatal fault.
    pub sentinel: String,

    /// Expected path shape, echoed in malformed-request errors.
    pub path_hint: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            sentinel: "XTRAC".to_string(),
            path_hint: "/quote/<symbol>".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,

    /// `pretty` or `json`.
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "quote_gateway=debug,tower_http=debug".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
