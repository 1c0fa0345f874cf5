//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, backstop timeout)
//! - Bind server to listener
//! - Serve until the shutdown signal, then drain

use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::bridge::upstream::UpstreamError;
use crate::bridge::BridgeHandler;
use crate::config::BridgeConfig;
use crate::http::currency::{get_currency, health};
use crate::http::deadline::enforce_deadline;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::not_found;

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub bridge: BridgeHandler,
}

/// HTTP server for the currency bridge.
pub struct HttpServer {
    router: Router,
    config: BridgeConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: BridgeConfig) -> Result<Self, UpstreamError> {
        let bridge = BridgeHandler::from_config(&config)?;
        Ok(Self::with_bridge(config, bridge))
    }

    /// Create a server around an already built bridge handler.
    pub fn with_bridge(config: BridgeConfig, bridge: BridgeHandler) -> Self {
        let router = build_router(&config, AppState { bridge });
        Self { router, config }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The fully layered router, e.g. for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(config: &BridgeConfig, state: AppState) -> Router {
    Router::new()
        .route("/api/currency", get(get_currency))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(from_fn_with_state(
            Duration::from_secs(config.timeouts.request_secs),
            enforce_deadline,
        ))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request.headers().request_id(),
            )
        }))
        .layer(set_request_id_layer())
}
