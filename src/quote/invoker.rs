//! Runs the downstream handler on its own task and waits for it.
//!
//! # Responsibilities
//! - Spawn exactly one worker per call, owning the response recorder
//! - Optionally give the worker a short inner deadline
//! - Optionally cancel the call's context while the worker runs
//! - Join the worker unconditionally, then add a random latency
//! - Cancel the call's context on every exit, including when the caller
//!   drops the future before the join
//!
//! # Design Decisions
//! - The join is a hard barrier: neither the inner deadline nor the cancel
//!   shortens it. They only change what the cooperative handler sees in its
//!   `RequestContext`
//! - Mapping cancellation to a status code is the handler's job; the invoker
//!   only decides when control returns
//! - A worker that dies without answering is recorded as `502`, so the
//!   caller never reads an unwritten result

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use tokio::time::Instant;
use tower::{Service, ServiceExt};

use crate::config::SimulationConfig;
use crate::observability::metrics;
use crate::quote::recorder::{RecordedResult, ResponseRecorder};
use crate::resilience::{Chance, RequestContext};

/// What the simulation did to one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvocationReport {
    /// The worker ran under the short inner deadline.
    pub inner_timeout: bool,
    /// The call's context was cancelled while the worker ran.
    pub cancelled: bool,
    /// Time from spawn to join, before the added latency.
    pub elapsed: Duration,
}

/// The joined worker's result plus what happened around it.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub result: RecordedResult,
    pub report: InvocationReport,
}

/// Executes downstream calls under the configured simulation.
#[derive(Debug, Clone)]
pub struct TimedInvoker {
    simulation: SimulationConfig,
    max_body_bytes: usize,
    chance: Arc<dyn Chance>,
}

impl TimedInvoker {
    pub fn new(
        simulation: SimulationConfig,
        max_body_bytes: usize,
        chance: Arc<dyn Chance>,
    ) -> Self {
        Self {
            simulation,
            max_body_bytes,
            chance,
        }
    }

    /// Run `downstream` once with `request` and return what it answered.
    ///
    /// The worker sees a child of `base` in its request extensions. Control
    /// returns only after the worker task has finished.
    pub async fn invoke<S>(
        &self,
        downstream: S,
        mut request: Request<Body>,
        base: &RequestContext,
    ) -> Invocation
    where
        S: Service<Request<Body>, Response = Response, Error = Infallible> + Send + 'static,
        S::Future: Send,
    {
        let ctx = base.child();
        // Cancels the worker's context if this future is dropped mid-call.
        let cancel_on_exit = ctx.drop_guard();
        let probability = self.simulation.trigger_probability;

        let inner_timeout = self.simulation.maybe_timeout && self.chance.flip(probability);
        let worker_ctx = if inner_timeout {
            metrics::record_simulation("inner_timeout");
            tracing::debug!(timeout_ms = self.simulation.inner_timeout_ms, "Inner timeout armed");
            ctx.with_timeout(Duration::from_millis(self.simulation.inner_timeout_ms))
        } else {
            ctx.clone()
        };
        request.extensions_mut().insert(worker_ctx);

        let max_body_bytes = self.max_body_bytes;
        let started = Instant::now();
        let worker = tokio::spawn(async move {
            let mut recorder = ResponseRecorder::new(max_body_bytes);
            match downstream.oneshot(request).await {
                Ok(response) => recorder.capture(response).await,
                Err(never) => match never {},
            }
            recorder
        });

        let cancelled = self.simulation.maybe_cancel && self.chance.flip(probability);
        if cancelled {
            tracing::info!("Coin toss says cancel");
            metrics::record_simulation("cancel");
            ctx.cancel();
        }

        let result = match worker.await {
            Ok(recorder) => recorder.into_result(),
            Err(e) => {
                tracing::error!(error = %e, "Downstream worker failed");
                let mut recorder = ResponseRecorder::new(max_body_bytes);
                recorder.write(StatusCode::BAD_GATEWAY, format!("downstream worker failed: {e}"));
                recorder.into_result()
            }
        };
        let elapsed = started.elapsed();

        // Nothing derived from this call may outlive it.
        drop(cancel_on_exit);

        let delay = self.chance.delay(self.simulation.max_delay_ms);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Invocation {
            result,
            report: InvocationReport {
                inner_timeout,
                cancelled,
                elapsed,
            },
        }
    }
}
