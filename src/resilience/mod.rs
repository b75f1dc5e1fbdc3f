//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → context.rs (root RequestContext: token + optional deadline)
//!     → invoker derives a child context per downstream call
//!     → optional inner deadline / out-of-band cancel (chance.rs decides)
//!     → downstream handler observes the context cooperatively
//! ```
//!
//! # Design Decisions
//! - Cancellation never preempts; handlers check the context themselves
//! - Every random decision goes through the `Chance` trait so tests are
//!   deterministic

pub mod chance;
pub mod context;

pub use chance::{Chance, FixedChance, ThreadChance};
pub use context::{DoneReason, RequestContext};
