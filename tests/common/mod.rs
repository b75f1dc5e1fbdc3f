//! Shared utilities for the integration tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use quote_gateway::config::{DownstreamConfig, GatewayConfig};
use quote_gateway::http::{mock_backend, HttpServer};
use quote_gateway::lifecycle::Shutdown;
use quote_gateway::observability::EndToEndTimer;
use quote_gateway::quote::codec;
use quote_gateway::resilience::Chance;
use tokio::net::TcpListener;
use tower::util::BoxCloneService;

/// Start the mock SOAP backend on an ephemeral port.
pub async fn start_soap_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = mock_backend::router(&DownstreamConfig::default().path);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a gateway pointed at `backend` on an ephemeral port.
pub async fn start_gateway(
    mut config: GatewayConfig,
    chance: Arc<dyn Chance>,
    backend: SocketAddr,
) -> (SocketAddr, Shutdown) {
    config.downstream.address = backend.to_string();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::with_chance(config, chance).unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

/// Defaults with the random post-call latency switched off.
pub fn quiet_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.simulation.max_delay_ms = 0;
    config
}

/// Inbound request carrying a fresh timer, as the timing middleware would.
pub fn timed_request(path: &str) -> (Request<Body>, Arc<EndToEndTimer>) {
    let timer = Arc::new(EndToEndTimer::new("test"));
    let mut request = Request::get(path).body(Body::empty()).unwrap();
    request.extensions_mut().insert(Arc::clone(&timer));
    (request, timer)
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// What a scripted downstream saw.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub soapaction: Option<String>,
    pub symbol: Option<String>,
}

/// Downstream that counts calls, remembers the last request and answers
/// with a fixed status and body.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    pub calls: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Option<Seen>>>,
}

impl Scripted {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Option<Seen> {
        self.seen.lock().unwrap().clone()
    }

    /// Service answering `status` with `body` after recording the request.
    pub fn service(
        &self,
        status: StatusCode,
        body: String,
    ) -> BoxCloneService<Request<Body>, Response, Infallible> {
        let calls = Arc::clone(&self.calls);
        let seen = Arc::clone(&self.seen);
        BoxCloneService::new(tower::service_fn(move |request: Request<Body>| {
            let calls = Arc::clone(&calls);
            let seen = Arc::clone(&seen);
            let body = body.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let (parts, body_in) = request.into_parts();
                let header = |name: &str| {
                    parts
                        .headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                let method = parts.method.to_string();
                let path = parts.uri.path().to_string();
                let content_type = header("content-type");
                let soapaction = header("soapaction");
                let bytes = axum::body::to_bytes(body_in, 64 * 1024).await.unwrap();
                *seen.lock().unwrap() = Some(Seen {
                    method,
                    path,
                    content_type,
                    soapaction,
                    symbol: codec::decode_request(&bytes).ok(),
                });
                Ok::<_, Infallible>((status, body).into_response())
            }
        }))
    }
}

/// Response envelope carrying `price`.
pub fn price_envelope(price: &str) -> String {
    codec::encode_response(price).unwrap()
}
