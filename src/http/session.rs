//! Best-effort session identification.
//!
//! The session id is only ever logged. A missing or malformed
//! `x-session-id` header is ignored.

use axum::{extract::Request, middleware::Next, response::Response};

pub const X_SESSION_ID: &str = "x-session-id";

/// Session id attached to a request by [`extract_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub i64);

impl SessionId {
    pub fn from_request<B>(request: &axum::http::Request<B>) -> Option<Self> {
        request.extensions().get::<Self>().copied()
    }
}

/// Middleware: parse `x-session-id` into a [`SessionId`] extension.
pub async fn extract_session(mut request: Request, next: Next) -> Response {
    let session = request
        .headers()
        .get(X_SESSION_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok());

    if let Some(id) = session {
        request.extensions_mut().insert(SessionId(id));
    }

    next.run(request).await
}
