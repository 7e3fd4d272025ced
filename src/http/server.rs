//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the relay handler
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener, shut down gracefully
//! - Run each request through parse → filter → forward → relay
//! - Attach CORS headers to every response

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request},
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigError, ProxyConfig};
use crate::error::ProxyError;
use crate::http::forward::Forwarder;
use crate::http::request::{client_address, request_id, UuidRequestId};
use crate::http::response::{preflight, CorsHeaders};
use crate::lifecycle::shutdown::wait_for;
use crate::lifecycle::shutdown_signal;
use crate::observability::metrics::{self, Outcome};
use crate::routing::{resolve_target, PathMatcher};
use crate::security::TargetFilter;

/// Application state injected into handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub matcher: Arc<PathMatcher>,
    pub filter: Arc<TargetFilter>,
    pub forwarder: Arc<Forwarder>,
}

impl AppState {
    /// Compile patterns and build the outbound client.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
        let matcher = PathMatcher::from_config(&config.routing)
            .map_err(|e| ConfigError::Validation(vec![e]))?;
        let filter = TargetFilter::from_config(&config.security)
            .map_err(|e| ConfigError::Validation(vec![e]))?;
        let forwarder = Forwarder::new(config).map_err(ConfigError::HttpClient)?;

        Ok(Self {
            matcher: Arc::new(matcher),
            filter: Arc::new(filter),
            forwarder: Arc::new(forwarder),
        })
    }

    /// Parse, filter and forward one request.
    async fn relay(&self, request: Request<Body>) -> Result<Response, ProxyError> {
        let path = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let target = resolve_target(&self.matcher, path)?;
        self.filter.check(&target)?;

        self.forwarder.forward(request, &target).await
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let state = AppState::from_config(&config)?;
        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for driving the proxy without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until an OS signal arrives or `shutdown_rx` fires.
    ///
    /// A receiver whose `Shutdown` has been dropped stops the server at once.
    pub async fn run(self, listener: TcpListener, shutdown_rx: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_body_bytes = self.config.limits.max_body_bytes,
            timeout_ms = self.config.timeouts.request_ms,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {},
                    _ = wait_for(shutdown_rx) => {},
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Single entry point for every method and path.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let cors = CorsHeaders::from_request(&method, request.headers());
    let request_id = request_id(request.headers());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client = client_address(request.headers(), peer);

    let (mut response, outcome) = if method == Method::OPTIONS {
        (preflight(), Outcome::Preflight)
    } else {
        match state.relay(request).await {
            Ok(response) => (response, Outcome::Completed),
            Err(e) => {
                let outcome = if e.is_rejection() {
                    metrics::record_rejected(e.kind());
                    tracing::info!(request_id = %request_id, client = ?client, reason = e.kind(), error = %e, "Request rejected");
                    Outcome::Rejected
                } else {
                    tracing::warn!(request_id = %request_id, client = ?client, reason = e.kind(), error = %e, "Relay failed");
                    Outcome::Failed
                };
                (e.into_response(), outcome)
            }
        }
    };

    cors.apply(response.headers_mut());

    let status = response.status().as_u16();
    metrics::record_request(method.as_str(), status, outcome, start);
    tracing::debug!(
        request_id = %request_id,
        client = ?client,
        status,
        outcome = outcome.as_str(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request finished"
    );

    response
}
