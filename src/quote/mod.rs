//! Quote translation subsystem.
//!
//! # Data Flow
//! ```text
//! GET /quote/<symbol>
//!     → extract.rs (symbol from path, 404 on bad shape)
//!     → codec.rs (SOAP request envelope)
//!     → invoker.rs (downstream handler on a worker task, joined)
//!         → recorder.rs (status + body the handler wrote)
//!     → codec.rs (price out of the response envelope)
//!     → "<price>\n"
//! ```
//!
//! pipeline.rs orchestrates the above inside the request's timer contributor.

pub mod codec;
pub mod error;
pub mod extract;
pub mod invoker;
pub mod pipeline;
pub mod recorder;

pub use error::{QuoteError, UnrecoverableFault};
pub use invoker::{Invocation, InvocationReport, TimedInvoker};
pub use pipeline::{RequestPipeline, Stage};
pub use recorder::{RecordedResult, ResponseRecorder};
