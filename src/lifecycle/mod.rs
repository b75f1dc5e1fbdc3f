//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! SIGTERM / Ctrl-C (signals.rs) ──┐
//!                                 ├──→ HttpServer stops accepting, drains
//! Shutdown::trigger (shutdown.rs) ┘
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
