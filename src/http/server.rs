//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the axum router with every path going to the quote service
//! - Wire up middleware (tracing, request id, timing, panic supervision)
//! - Serve until a signal or the shutdown broadcast arrives
//!
//! # Layer order (outer → inner)
//! ```text
//! trace → set request id → propagate request id → timing → catch-panic
//!       → session → quote → downstream
//! ```
//!
//! Timing sits outside catch-panic so a faulted request still reports its
//! timer, with the 500 the supervisor produced.

use std::any::Any;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    handler::Handler,
    http::{uri::InvalidUri, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{Layer, Service};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::forward::{forward, Forwarder};
use crate::http::quote_layer::QuoteLayer;
use crate::http::session::extract_session;
use crate::lifecycle::wait_for_signal;
use crate::observability::timing::record_timing;
use crate::quote::RequestPipeline;
use crate::resilience::{Chance, ThreadChance};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid downstream address: {0}")]
    Downstream(#[from] InvalidUri),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP front end of the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Gateway forwarding to the configured SOAP backend.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        Self::with_chance(config, Arc::new(ThreadChance))
    }

    /// Same as [`HttpServer::new`] with injected randomness.
    pub fn with_chance(
        config: GatewayConfig,
        chance: Arc<dyn Chance>,
    ) -> Result<Self, ServerError> {
        let forwarder = Arc::new(Forwarder::new(&config.downstream)?);
        let downstream = forward.with_state(forwarder);
        Ok(Self::with_downstream(config, chance, downstream))
    }

    /// Gateway whose downstream handler is `downstream` instead of the
    /// forwarder.
    pub fn with_downstream<S>(config: GatewayConfig, chance: Arc<dyn Chance>, downstream: S) -> Self
    where
        S: Service<Request, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send,
    {
        let pipeline = RequestPipeline::new(&config, chance);
        let quote = QuoteLayer::new(pipeline).layer(downstream);

        let router = Router::new()
            .fallback_service(quote)
            .layer(middleware::from_fn(extract_session))
            .layer(CatchPanicLayer::custom(supervise_panic))
            .layer(middleware::from_fn(record_timing))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http());

        Self { router, config }
    }

    /// The router, for driving the gateway in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve on `listener` until a signal arrives or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            downstream = %self.config.downstream.address,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = wait_for_signal() => {},
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Host supervisor: a panic in the quote service becomes a plain 500.
fn supervise_panic(payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::FixedChance;
    use tower::ServiceExt;

    const X_REQUEST_ID: &str = "x-request-id";

    fn server() -> HttpServer {
        let mut config = GatewayConfig::default();
        config.simulation.max_delay_ms = 0;
        let downstream = tower::service_fn(|_req: Request| async {
            Ok::<_, Infallible>(StatusCode::OK.into_response())
        });
        HttpServer::with_downstream(config, Arc::new(FixedChance::default()), downstream)
    }

    #[tokio::test]
    async fn assigns_request_id() {
        let request = Request::builder().uri("/quote/").body(Body::empty()).unwrap();
        let response = server().router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn keeps_caller_request_id() {
        let request = Request::builder()
            .uri("/quote/")
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = server().router().oneshot(request).await.unwrap();

        assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
    }

    #[tokio::test]
    async fn protected_symbol_is_supervised() {
        let request = Request::builder()
            .uri("/quote/XTRAC")
            .body(Body::empty())
            .unwrap();
        let response = server().router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn rejects_bad_downstream_address() {
        let mut config = GatewayConfig::default();
        config.downstream.address = "not an authority".into();
        assert!(matches!(HttpServer::new(config), Err(ServerError::Downstream(_))));
    }
}
