//! Quote pipeline errors.
//!
//! [`QuoteError`] covers everything the pipeline answers with a normal HTTP
//! response. [`UnrecoverableFault`] is deliberately a separate type with no
//! `IntoResponse` and no conversion into `QuoteError`: it must escape the
//! pipeline instead of becoming a 500.

use axum::{
    body::{Body, Bytes},
    http::{uri::InvalidUri, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::quote::codec::{DecodeError, EncodeError};
use crate::quote::extract::ExtractError;

/// Recoverable pipeline failures.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Path did not have the `/<prefix>/<id>` shape.
    #[error(transparent)]
    MalformedRequest(#[from] ExtractError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("invalid downstream path: {0}")]
    Rewrite(#[from] InvalidUri),

    /// The backend answered with a status above 299.
    #[error("downstream returned status {status}")]
    Downstream { status: u16, body: Bytes },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The host did not attach a timer to the request.
    #[error("No timer in call context")]
    MissingTimer,
}

impl QuoteError {
    pub fn status(&self) -> StatusCode {
        match self {
            QuoteError::MalformedRequest(_) => StatusCode::NOT_FOUND,
            QuoteError::Downstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            QuoteError::Encode(_)
            | QuoteError::Rewrite(_)
            | QuoteError::Decode(_)
            | QuoteError::MissingTimer => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for QuoteError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            // Passed through verbatim, whatever the backend sent.
            QuoteError::Downstream { body, .. } => (status, Body::from(body)).into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}

/// Faults that must not be answered as ordinary errors.
#[derive(Debug, Error)]
pub enum UnrecoverableFault {
    /// The reserved symbol the backend can never price.
    #[error("priceless! refusing to price protected symbol {symbol}")]
    ProtectedSymbol { symbol: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let malformed = QuoteError::MalformedRequest(ExtractError {
            expected: "/quote/<symbol>".into(),
        });
        assert_eq!(malformed.status(), StatusCode::NOT_FOUND);
        assert_eq!(QuoteError::MissingTimer.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            QuoteError::Decode(DecodeError::Empty).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let downstream = QuoteError::Downstream {
            status: 503,
            body: Bytes::from_static(b"busy"),
        };
        assert_eq!(downstream.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn downstream_body_passes_through() {
        let response = QuoteError::Downstream {
            status: 418,
            body: Bytes::from_static(b"<teapot/>"),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"<teapot/>");
    }

    #[tokio::test]
    async fn decode_error_message_is_the_body() {
        let response = QuoteError::Decode(DecodeError::Empty).into_response();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"empty response envelope");
    }
}
