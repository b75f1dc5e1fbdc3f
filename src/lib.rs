//! HTTP to SOAP stock quote gateway library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod quote;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use quote::RequestPipeline;
