//! Request-scoped cancellation and deadlines.
//!
//! # Responsibilities
//! - Carry a cancellation token and an optional deadline for one request
//! - Derive child contexts (cancellable, or with a tighter deadline)
//! - Let downstream handlers observe cancellation cooperatively
//!
//! # Design Decisions
//! - Cancellation is cooperative: nothing here stops a running task, the
//!   holder of a context decides what to do once [`RequestContext::done`]
//!   resolves
//! - Cancelling a child never cancels its parent
//! - A child deadline can only be tighter than the parent's

use std::fmt;
use std::time::Duration;

use axum::http::Extensions;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Why a context stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    /// The token (or one of its ancestors) was cancelled.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for DoneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoneReason::Cancelled => f.write_str("cancelled"),
            DoneReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Cancellation signal, optional deadline and service tag for one request.
///
/// Cloning shares the same token; use [`child`](Self::child) to get an
/// independently cancellable context.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    service: Option<String>,
}

impl RequestContext {
    /// A fresh root context with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// The context attached to a request, if the host put one there.
    pub fn from_extensions(extensions: &Extensions) -> Option<Self> {
        extensions.get::<Self>().cloned()
    }

    /// Derive a context that can be cancelled without touching `self`.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            service: self.service.clone(),
        }
    }

    /// Derive a child whose deadline is at most `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let mut child = self.child();
        child.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        child
    }

    /// Tag the context with the downstream service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Guard that cancels this context when dropped, e.g. when the future
    /// holding it is abandoned.
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// Signal cancellation to this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Non-blocking check: `Some` once the context is finished.
    pub fn done_reason(&self) -> Option<DoneReason> {
        if self.token.is_cancelled() {
            return Some(DoneReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(DoneReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves when the context is cancelled or its deadline passes.
    ///
    /// Never resolves for a context with no deadline that nobody cancels.
    pub async fn done(&self) -> DoneReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => DoneReason::Cancelled,
                _ = tokio::time::sleep_until(deadline) => DoneReason::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                DoneReason::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_cancel_does_not_reach_parent() {
        let parent = RequestContext::new();
        let child = parent.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn parent_cancel_reaches_children() {
        let parent = RequestContext::new();
        let child = parent.child();
        let grandchild = child.with_timeout(Duration::from_secs(60));

        parent.cancel();
        assert_eq!(child.done_reason(), Some(DoneReason::Cancelled));
        assert_eq!(grandchild.done_reason(), Some(DoneReason::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_resolves_done() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(100));
        assert_eq!(ctx.done_reason(), None);

        assert_eq!(ctx.done().await, DoneReason::DeadlineExceeded);
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn child_deadline_never_extends_parent() {
        let parent = RequestContext::new().with_timeout(Duration::from_millis(50));
        let child = parent.with_timeout(Duration::from_secs(10));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn drop_guard_cancels_on_drop() {
        let ctx = RequestContext::new();
        let child = ctx.child();

        let guard = ctx.drop_guard();
        assert!(!child.is_cancelled());
        drop(guard);
        assert_eq!(child.done_reason(), Some(DoneReason::Cancelled));
    }

    #[test]
    fn disarmed_guard_leaves_context_alone() {
        let ctx = RequestContext::new();
        ctx.drop_guard().disarm();
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn service_tag_is_inherited() {
        let ctx = RequestContext::new().with_service("QuoteSoapService");
        assert_eq!(ctx.child().service(), Some("QuoteSoapService"));
    }
}
