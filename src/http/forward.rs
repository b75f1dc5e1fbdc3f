//! Default downstream handler: forward the SOAP call to the backend.
//!
//! # Responsibilities
//! - Point the rewritten request at the configured backend
//! - Honour the cooperative `RequestContext` the invoker attached
//! - Map transport failures to gateway statuses
//!
//! # Design Decisions
//! - Cancellation and deadline both answer `504 Gateway Timeout`; this is the
//!   backend-side decision the invoker deliberately leaves to the handler
//! - Transport errors answer `502 Bad Gateway`

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        uri::{Authority, Scheme},
        StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::DownstreamConfig;
use crate::resilience::RequestContext;

/// Shared state of the forwarding handler.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    authority: Authority,
}

impl Forwarder {
    pub fn new(config: &DownstreamConfig) -> Result<Self, axum::http::uri::InvalidUri> {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self {
            client,
            authority: Authority::from_str(&config.address)?,
        })
    }

    fn target(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let mut parts = uri.clone().into_parts();
        parts.scheme = Some(Scheme::HTTP);
        parts.authority = Some(self.authority.clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some("/".parse()?);
        }
        Ok(Uri::from_parts(parts)?)
    }
}

/// Forward one request to the backend, giving up when its context is done.
pub async fn forward(State(forwarder): State<Arc<Forwarder>>, mut request: Request) -> Response {
    let ctx = RequestContext::from_extensions(request.extensions()).unwrap_or_default();

    let uri = match forwarder.target(request.uri()) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build backend URI");
            return (StatusCode::BAD_GATEWAY, "invalid backend address").into_response();
        }
    };
    *request.uri_mut() = uri;

    tokio::select! {
        result = forwarder.client.request(request) => match result {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    service = ctx.service().unwrap_or("backend"),
                    "Upstream error"
                );
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        },
        reason = ctx.done() => {
            tracing::warn!(
                reason = %reason,
                service = ctx.service().unwrap_or("backend"),
                "Downstream call abandoned"
            );
            (StatusCode::GATEWAY_TIMEOUT, format!("downstream call {reason}")).into_response()
        }
    }
}
