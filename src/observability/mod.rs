//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request entry:
//!     → timing.rs (EndToEndTimer into request extensions)
//!     → pipeline renames the timer, opens/ends its contributor
//! Response ready:
//!     → timing.rs (summary log line)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → logging.rs (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, request id from the HTTP layer
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
pub mod timing;

pub use timing::{timer_from_request, Contributor, ContributorRecord, EndToEndTimer};
