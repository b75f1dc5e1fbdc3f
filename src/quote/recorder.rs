//! Single-shot capture of what the downstream handler answered.
//!
//! The recorder is owned by the worker task. It is handed back through the
//! task's join handle, so the orchestrator can only read it after the worker
//! has finished.

use axum::{
    body::{Body, Bytes},
    http::StatusCode,
    response::Response,
};

/// Status and body captured from the downstream handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResult {
    pub status: u16,
    pub body: Bytes,
}

impl RecordedResult {
    pub fn is_error(&self) -> bool {
        self.status > 299
    }
}

/// In-memory response sink.
///
/// Starts as `200` with an empty body, the same as a fresh recorder the
/// handler never wrote to.
#[derive(Debug)]
pub struct ResponseRecorder {
    status: u16,
    body: Bytes,
    max_body_bytes: usize,
}

impl ResponseRecorder {
    pub fn new(max_body_bytes: usize) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            body: Bytes::new(),
            max_body_bytes,
        }
    }

    /// Capture a complete response, reading its body to the end.
    ///
    /// A body that cannot be read (or is larger than the limit) is recorded
    /// as `502` with the read error as body.
    pub async fn capture(&mut self, response: Response<Body>) {
        let (parts, body) = response.into_parts();
        match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => {
                self.status = parts.status.as_u16();
                self.body = bytes;
            }
            Err(e) => {
                tracing::warn!(
                    status = parts.status.as_u16(),
                    error = %e,
                    "Failed to read downstream body"
                );
                self.write(StatusCode::BAD_GATEWAY, format!("failed to read downstream body: {e}"));
            }
        }
    }

    /// Record a status and body directly.
    pub fn write(&mut self, status: StatusCode, body: impl Into<Bytes>) {
        self.status = status.as_u16();
        self.body = body.into();
    }

    /// Hand out what was recorded. Consumes the recorder.
    pub fn into_result(self) -> RecordedResult {
        RecordedResult {
            status: self.status,
            body: self.body,
        }
    }
}
