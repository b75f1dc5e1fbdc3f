//! Tower layer that puts the quote pipeline in front of a handler.
//!
//! ```rust,ignore
//! let service = QuoteLayer::new(pipeline).layer(forwarder);
//! ```
//!
//! The wrapped service is the downstream handler: each request is rewritten
//! into a SOAP call and handed to a fresh clone of it on a worker task.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{body::Body, extract::Request, response::Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::quote::RequestPipeline;

#[derive(Debug, Clone)]
pub struct QuoteLayer {
    pipeline: Arc<RequestPipeline>,
}

impl QuoteLayer {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

impl<S> Layer<S> for QuoteLayer {
    type Service = QuoteService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        QuoteService {
            inner,
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

/// A downstream handler wrapped by the quote pipeline.
#[derive(Debug, Clone)]
pub struct QuoteService<S> {
    inner: S,
    pipeline: Arc<RequestPipeline>,
}

impl<S> Service<Request<Body>> for QuoteService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Each call drives its own clone of the inner service to readiness.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let inner = self.inner.clone();
        let pipeline = Arc::clone(&self.pipeline);

        Box::pin(async move {
            match pipeline.handle(inner, request).await {
                Ok(response) => Ok(response),
                Err(fault) => {
                    tracing::error!(fault = %fault, "Unrecoverable fault in quote handler");
                    panic!("{fault}");
                }
            }
        })
    }
}
