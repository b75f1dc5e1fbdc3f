//! HTTP host surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum router, trace / request id / timing / catch-panic)
//!     → session.rs (x-session-id → SessionId)
//!     → quote_layer.rs (RequestPipeline around the downstream handler)
//!     → forward.rs (SOAP call to the backend, honouring RequestContext)
//! ```
//!
//! mock_backend.rs is the SOAP backend used by the test harness and the
//! `mock-quote-backend` binary.

pub mod forward;
pub mod mock_backend;
pub mod quote_layer;
pub mod server;
pub mod session;

pub use forward::Forwarder;
pub use quote_layer::{QuoteLayer, QuoteService};
pub use server::{HttpServer, ServerError};
pub use session::SessionId;
