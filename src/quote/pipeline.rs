//! The quote request pipeline.
//!
//! ```text
//! Start → Validated → Dispatched → Awaited → Decoded → Responded
//!   └──────────┴───────────┴──────────┴─────────┴──→ Responded(error)
//! ```
//!
//! Every exit goes through [`RequestPipeline::handle`], which is the only
//! place the contributor is ended. The protected-symbol fault leaves as
//! `Err(UnrecoverableFault)` after the contributor is closed with it.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tower::Service;

use crate::config::{DownstreamConfig, GatewayConfig, QuoteConfig, TimingConfig};
use crate::http::session::SessionId;
use crate::observability::{timer_from_request, Contributor};
use crate::quote::codec::{self, OutboundRequest};
use crate::quote::error::{QuoteError, UnrecoverableFault};
use crate::quote::extract::extract_resource;
use crate::quote::invoker::TimedInvoker;
use crate::resilience::{Chance, RequestContext};

/// Where a request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Validated,
    Dispatched,
    Awaited,
    Decoded,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Validated => "validated",
            Stage::Dispatched => "dispatched",
            Stage::Awaited => "awaited",
            Stage::Decoded => "decoded",
            Stage::Responded => "responded",
        };
        f.write_str(name)
    }
}

enum PipelineError {
    Quote(QuoteError),
    Fault(UnrecoverableFault),
}

impl From<QuoteError> for PipelineError {
    fn from(e: QuoteError) -> Self {
        PipelineError::Quote(e)
    }
}

/// Translates `/<prefix>/<symbol>` into a SOAP quote call and back.
#[derive(Debug, Clone)]
pub struct RequestPipeline {
    quote: QuoteConfig,
    downstream: DownstreamConfig,
    timing: TimingConfig,
    invoker: TimedInvoker,
    chance: Arc<dyn Chance>,
}

impl RequestPipeline {
    pub fn new(config: &GatewayConfig, chance: Arc<dyn Chance>) -> Self {
        Self {
            quote: config.quote.clone(),
            downstream: config.downstream.clone(),
            timing: config.timing.clone(),
            invoker: TimedInvoker::new(
                config.simulation.clone(),
                config.downstream.max_body_bytes,
                Arc::clone(&chance),
            ),
            chance,
        }
    }

    /// Run one request through the pipeline against `downstream`.
    ///
    /// Every recoverable outcome is a response. `Err` means the request hit
    /// the protected symbol and must not be answered normally.
    pub async fn handle<S>(
        &self,
        downstream: S,
        request: Request<Body>,
    ) -> Result<Response, UnrecoverableFault>
    where
        S: Service<Request<Body>, Response = Response, Error = Infallible> + Send + 'static,
        S::Future: Send,
    {
        let Some(timer) = timer_from_request(&request) else {
            tracing::error!("No timer in call context");
            return Ok(QuoteError::MissingTimer.into_response());
        };

        if !self.timing.service_names.is_empty() {
            let names = &self.timing.service_names;
            let label = &names[self.chance.pick(names.len())];
            timer.set_name(format!("{label}-quote"));
        }

        let contributor = timer.start_contributor(&self.timing.contributor);
        tracing::debug!(stage = %Stage::Start, timer = %timer.name(), "Quote request");

        match self.process(downstream, request, &contributor).await {
            Ok(price) => {
                contributor.end(None);
                tracing::debug!(stage = %Stage::Responded, price = %price, "Quote priced");
                Ok((StatusCode::OK, format!("{price}\n")).into_response())
            }
            Err(PipelineError::Quote(e)) => {
                contributor.end(Some(&e));
                tracing::debug!(
                    stage = %Stage::Responded,
                    error = %e,
                    status = e.status().as_u16(),
                    "Quote failed"
                );
                Ok(e.into_response())
            }
            Err(PipelineError::Fault(fault)) => {
                contributor.end(Some(&fault));
                Err(fault)
            }
        }
    }

    async fn process<S>(
        &self,
        downstream: S,
        request: Request<Body>,
        contributor: &Contributor,
    ) -> Result<String, PipelineError>
    where
        S: Service<Request<Body>, Response = Response, Error = Infallible> + Send + 'static,
        S::Future: Send,
    {
        let symbol = extract_resource(request.uri().path(), &self.quote.path_hint)
            .map_err(QuoteError::from)?;
        tracing::debug!(stage = %Stage::Validated, symbol = %symbol);

        if symbol == self.quote.sentinel {
            tracing::error!(symbol = %symbol, "Protected symbol requested");
            return Err(PipelineError::Fault(UnrecoverableFault::ProtectedSymbol { symbol }));
        }

        if let Some(SessionId(session)) = SessionId::from_request(&request) {
            tracing::info!(session, symbol = %symbol, "Quote for session");
        }

        let payload = codec::encode(&symbol).map_err(QuoteError::from)?;
        let outbound = self.rewrite(request, payload)?;
        let base = RequestContext::from_extensions(outbound.extensions())
            .unwrap_or_default()
            .with_service(self.downstream.service_name.as_str());

        tracing::debug!(
            stage = %Stage::Dispatched,
            symbol = %symbol,
            service = %self.downstream.service_name
        );
        let invocation = self.invoker.invoke(downstream, outbound, &base).await;
        let recorded = invocation.result;
        contributor.record_service_call(
            &self.downstream.service_name,
            invocation.report.elapsed,
            recorded.status,
        );
        tracing::debug!(
            stage = %Stage::Awaited,
            status = recorded.status,
            inner_timeout = invocation.report.inner_timeout,
            cancelled = invocation.report.cancelled,
            "Downstream joined"
        );

        if recorded.is_error() {
            tracing::warn!(status = recorded.status, "SOAP service returned error");
            return Err(QuoteError::Downstream {
                status: recorded.status,
                body: recorded.body,
            }
            .into());
        }

        let price = codec::decode(&recorded.body).map_err(QuoteError::from)?;
        tracing::debug!(stage = %Stage::Decoded, symbol = %symbol);
        Ok(price)
    }

    /// Turn the inbound request into the SOAP POST, keeping its headers and
    /// extensions (timer, session, request id).
    fn rewrite(
        &self,
        request: Request<Body>,
        payload: OutboundRequest,
    ) -> Result<Request<Body>, QuoteError> {
        let (mut parts, _inbound_body) = request.into_parts();

        parts.method = Method::POST;
        parts.uri = self.downstream.path.parse::<Uri>()?;
        parts.headers.remove(header::CONTENT_LENGTH);
        parts
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(codec::CONTENT_TYPE));
        parts
            .headers
            .insert("soapaction", HeaderValue::from_static(codec::SOAP_ACTION));

        Ok(Request::from_parts(parts, Body::from(payload.into_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::EndToEndTimer;
    use crate::resilience::FixedChance;

    fn pipeline() -> RequestPipeline {
        let mut config = GatewayConfig::default();
        config.simulation.max_delay_ms = 0;
        RequestPipeline::new(&config, Arc::new(FixedChance { pick: 3, ..Default::default() }))
    }

    #[test]
    fn rewrite_targets_soap_endpoint() {
        let mut inbound = Request::builder()
            .method(Method::GET)
            .uri("/quote/ABC")
            .header("x-request-id", "r-1")
            .body(Body::empty())
            .unwrap();
        inbound.extensions_mut().insert(SessionId(7));

        let out = pipeline().rewrite(inbound, codec::encode("ABC").unwrap()).unwrap();

        assert_eq!(out.method(), Method::POST);
        assert_eq!(out.uri().path(), "/services/quote/getquote");
        assert_eq!(out.headers()["content-type"], codec::CONTENT_TYPE);
        assert_eq!(out.headers()["x-request-id"], "r-1");
        assert_eq!(SessionId::from_request(&out), Some(SessionId(7)));
    }

    #[tokio::test]
    async fn timer_is_renamed_from_label_set() {
        let timer = Arc::new(EndToEndTimer::new("quote-gateway"));
        let mut request = Request::builder().uri("/quote/").body(Body::empty()).unwrap();
        request.extensions_mut().insert(Arc::clone(&timer));

        let downstream = tower::service_fn(|_req: Request<Body>| async {
            Ok::<_, Infallible>(StatusCode::OK.into_response())
        });
        let response = pipeline().handle(downstream, request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(timer.name(), "delta-quote");
    }

    #[tokio::test]
    async fn missing_timer_is_internal_error() {
        let request = Request::builder().uri("/quote/ABC").body(Body::empty()).unwrap();
        let downstream = tower::service_fn(|_req: Request<Body>| async {
            Ok::<_, Infallible>(StatusCode::OK.into_response())
        });

        let response = pipeline().handle(downstream, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
