//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the hook and health handlers
//! - Wire up middleware (request ID, tracing, timeout, limits)
//!
//! The inbound timeout covers `/health` only. A hook invocation is bounded by
//! the per-call dispatch timeout instead, so a slow serial source still gets
//! its envelope rather than a bare 408.
//! - Bind server to listener and drain on shutdown

use std::future::Future;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, RawQuery, State},
    http::{HeaderMap, HeaderName, Method, Request},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tower::{limit::ConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::GatewayConfig;
use crate::gateway::{Gateway, GatewayReply};
use crate::http::{health, ingress};

/// Correlation header set on every request and echoed on every reply.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
}

/// HTTP front end of the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, gateway: Gateway) -> Self {
        let router = Self::build_router(&config, AppState { gateway });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        let health = Router::new()
            .route("/health", get(health::health))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route("/hooks/{source_id}", any(hook_handler))
            .route("/hooks", any(missing_source_handler))
            .merge(health)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(
                        TraceLayer::new_for_http()
                            .make_span_with(|request: &Request<Body>| {
                                let request_id = request
                                    .headers()
                                    .get(X_REQUEST_ID)
                                    .and_then(|v| v.to_str().ok())
                                    .unwrap_or_default();
                                tracing::info_span!(
                                    "http.request",
                                    method = %request.method(),
                                    uri = %request.uri(),
                                    request_id = %request_id,
                                )
                            })
                            .on_response(DefaultOnResponse::new().level(Level::INFO)),
                    )
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(ConcurrencyLimitLayer::new(config.listener.max_connections)),
            )
    }

    /// The fully layered router, for serving on a custom listener or in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` completes, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_connections = self.config.listener.max_connections,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// `ANY /hooks/{source_id}`
async fn hook_handler(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> GatewayReply {
    tracing::debug!(source_id = %source_id, method = %method, bytes = body.len(), "Webhook received");
    let context = ingress::build_context(&method, Some(&source_id), query.as_deref(), &headers, &body);
    state.gateway.handle(Some(&source_id), context).await
}

/// `ANY /hooks`: no source id at all.
async fn missing_source_handler(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> GatewayReply {
    let context = ingress::build_context(&method, None, query.as_deref(), &headers, &body);
    state.gateway.handle(None, context).await
}
