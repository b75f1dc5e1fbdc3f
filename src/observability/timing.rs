//! End-to-end request timers and contributors.
//!
//! # Responsibilities
//! - Attach one [`EndToEndTimer`] to every request (middleware)
//! - Let handlers rename the timer and open named [`Contributor`]s
//! - Summarise the timer once the response is ready
//!
//! # Design Decisions
//! - A contributor is a guard: [`Contributor::end`] consumes it, so it cannot
//!   be closed twice, and dropping it un-ended closes it as abandoned
//! - The timer lives in request extensions behind an `Arc`; handlers share it
//!   with the middleware that created it
//! - Contributor records outlive the guards so the summary (and tests) can
//!   inspect how each unit of work ended

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

use crate::observability::metrics;

/// Error text recorded for a contributor dropped without `end`.
pub const ABANDONED: &str = "contributor abandoned before end";

/// One downstream call recorded under a contributor.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCallRecord {
    pub service: String,
    pub elapsed: Duration,
    pub status: u16,
}

/// How a contributor ended (or that it has not yet).
#[derive(Debug, Clone, PartialEq)]
pub struct ContributorRecord {
    pub name: String,
    /// `None` while the contributor is still open.
    pub elapsed: Option<Duration>,
    /// The error it was closed with; `None` for success or still open.
    pub error: Option<String>,
    pub service_calls: Vec<ServiceCallRecord>,
}

impl ContributorRecord {
    pub fn is_closed(&self) -> bool {
        self.elapsed.is_some()
    }
}

#[derive(Debug)]
struct TimerState {
    name: String,
    contributors: Vec<ContributorRecord>,
}

/// Root timing span for one request.
#[derive(Debug)]
pub struct EndToEndTimer {
    id: Uuid,
    started: Instant,
    state: Mutex<TimerState>,
}

impl EndToEndTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Instant::now(),
            state: Mutex::new(TimerState {
                name: name.into(),
                contributors: Vec::new(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    /// Rename the timer; the last name set before `finish` is reported.
    pub fn set_name(&self, name: impl Into<String>) {
        self.lock().name = name.into();
    }

    /// Open a contributor. It stays open until ended or dropped.
    pub fn start_contributor(self: &Arc<Self>, name: impl Into<String>) -> Contributor {
        let name = name.into();
        let index = {
            let mut state = self.lock();
            state.contributors.push(ContributorRecord {
                name,
                elapsed: None,
                error: None,
                service_calls: Vec::new(),
            });
            state.contributors.len() - 1
        };
        Contributor {
            timer: Arc::clone(self),
            index,
            started: Instant::now(),
            closed: false,
        }
    }

    /// Snapshot of every contributor opened so far.
    pub fn contributors(&self) -> Vec<ContributorRecord> {
        self.lock().contributors.clone()
    }

    /// Log the summary and record metrics for the finished request.
    pub fn finish(&self, status: u16) {
        let elapsed = self.elapsed();
        let state = self.lock();

        for c in &state.contributors {
            tracing::debug!(
                timer = %state.name,
                contributor = %c.name,
                elapsed_ms = c.elapsed.map(|d| d.as_millis() as u64),
                error = c.error.as_deref().unwrap_or(""),
                service_calls = c.service_calls.len(),
                "Contributor"
            );
        }
        tracing::info!(
            timer = %state.name,
            timer_id = %self.id,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            contributors = state.contributors.len(),
            "Request timed"
        );
        metrics::record_request(&state.name, status, elapsed);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TimerState> {
        self.state.lock().expect("timer mutex poisoned")
    }
}

/// A named unit of work under an [`EndToEndTimer`].
///
/// Closed exactly once: by [`end`](Self::end), or on drop as abandoned.
#[derive(Debug)]
pub struct Contributor {
    timer: Arc<EndToEndTimer>,
    index: usize,
    started: Instant,
    closed: bool,
}

impl Contributor {
    /// Note a downstream call made on behalf of this contributor.
    pub fn record_service_call(&self, service: &str, elapsed: Duration, status: u16) {
        metrics::record_service_call(service, status, elapsed);
        let mut state = self.timer.lock();
        state.contributors[self.index].service_calls.push(ServiceCallRecord {
            service: service.to_string(),
            elapsed,
            status,
        });
    }

    /// Close the contributor with success (`None`) or the terminating error.
    pub fn end(mut self, error: Option<&dyn std::error::Error>) {
        self.close(error.map(ToString::to_string));
    }

    fn close(&mut self, error: Option<String>) {
        if self.closed {
            return;
        }
        self.closed = true;

        let elapsed = self.started.elapsed();
        let mut state = self.timer.lock();
        let record = &mut state.contributors[self.index];
        metrics::record_contributor(&record.name, error.is_none(), elapsed);
        record.elapsed = Some(elapsed);
        record.error = error;
    }
}

impl Drop for Contributor {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(timer_id = %self.timer.id, "Contributor dropped without end");
            self.close(Some(ABANDONED.to_string()));
        }
    }
}

/// The timer attached to a request, if any.
pub fn timer_from_request<B>(request: &axum::http::Request<B>) -> Option<Arc<EndToEndTimer>> {
    request.extensions().get::<Arc<EndToEndTimer>>().cloned()
}

/// Middleware that gives every request a timer and reports it afterwards.
pub async fn record_timing(mut request: Request, next: Next) -> Response {
    let timer = Arc::new(EndToEndTimer::new("quote-gateway"));
    request.extensions_mut().insert(Arc::clone(&timer));

    let response = next.run(request).await;

    timer.finish(response.status().as_u16());
    response
}
