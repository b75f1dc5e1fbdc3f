//! A stand-in SOAP quote backend.
//!
//! Used by the `mock-quote-backend` binary and the integration tests.
//! Symbols `BUSY` and `GARBLED` exercise the gateway's error paths.

use axum::{
    body::Bytes,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

use crate::quote::codec;

pub const BUSY: &str = "BUSY";
pub const GARBLED: &str = "GARBLED";

/// Router serving the quote call on `path`.
pub fn router(path: &str) -> Router {
    Router::new().route(path, post(get_quote))
}

/// Deterministic price for a symbol.
pub fn price_for(symbol: &str) -> String {
    let sum: u32 = symbol.bytes().map(u32::from).sum();
    format!("{}.{:02}", 100 + sum % 900, sum % 100)
}

async fn get_quote(body: Bytes) -> Response {
    let symbol = match codec::decode_request(&body) {
        Ok(symbol) => symbol,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting request envelope");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    match symbol.as_str() {
        BUSY => (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response(),
        GARBLED => (
            [(header::CONTENT_TYPE, codec::CONTENT_TYPE)],
            "<html>upstream maintenance</html>",
        )
            .into_response(),
        _ => {
            let price = price_for(&symbol);
            match codec::encode_response(&price) {
                Ok(xml) => {
                    tracing::debug!(symbol = %symbol, price = %price, "Priced");
                    ([(header::CONTENT_TYPE, codec::CONTENT_TYPE)], xml).into_response()
                }
                Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use tower::ServiceExt;

    async fn call(body: String) -> (StatusCode, Vec<u8>) {
        let request = axum::http::Request::post("/getquote").body(Body::from(body)).unwrap();
        let response = router("/getquote").oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        (status, bytes.to_vec())
    }

    #[test]
    fn price_is_stable() {
        assert_eq!(price_for("ABC"), price_for("ABC"));
        // 'A' + 'B' + 'C' = 198
        assert_eq!(price_for("ABC"), "298.98");
    }

    #[tokio::test]
    async fn prices_encoded_symbol() {
        let request = codec::encode("ABC").unwrap();
        let (status, body) = call(request.as_str().to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(codec::decode(&body).unwrap(), price_for("ABC"));
    }

    #[tokio::test]
    async fn busy_and_garbled() {
        let (status, body) = call(codec::encode(BUSY).unwrap().as_str().to_string()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, b"busy");

        let (status, body) = call(codec::encode(GARBLED).unwrap().as_str().to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(codec::decode(&body).is_err());
    }

    #[tokio::test]
    async fn rejects_non_envelope() {
        let (status, _) = call("hello".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
