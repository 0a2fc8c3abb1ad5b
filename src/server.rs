//! Axum server setup, shared application state, and shutdown signals.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the configured
//! routes, HTTP client, metrics sink, and forward timeout),
//! [`build_router`] for constructing the Axum router with middleware
//! layers, [`build_http_client`] for the connection-pooled hyper client,
//! and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::model::{Config, Webhook};
use crate::hook;
use crate::hook::drain::InFlight;
use crate::metrics::{metrics_handler, Metrics};

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

/// One configured webhook with its drain barrier. The definition is
/// immutable after startup; only the in-flight counter mutates.
#[derive(Debug)]
pub struct RouteState {
    pub webhook: Webhook,
    pub in_flight: Arc<InFlight>,
}

pub struct AppState {
    pub routes: Vec<Arc<RouteState>>,
    pub http_client: HttpClient,
    pub metrics: Arc<Metrics>,
    pub forward_timeout: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, metrics: Arc<Metrics>, forward_timeout: Duration) -> Self {
        let routes = config
            .webhooks
            .into_iter()
            .map(|webhook| {
                Arc::new(RouteState {
                    webhook,
                    in_flight: Arc::new(InFlight::default()),
                })
            })
            .collect();

        Self {
            routes,
            http_client: build_http_client(),
            metrics,
            forward_timeout,
        }
    }

    /// Exact-path lookup; webhook paths are validated unique at load time.
    #[must_use]
    pub fn route(&self, path: &str) -> Option<&Arc<RouteState>> {
        self.routes.iter().find(|r| r.webhook.path == path)
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // When multiple rustls crypto providers are compiled in, rustls cannot
    // auto-detect which one to use. Explicitly install `ring`.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

pub fn build_router(state: Arc<AppState>, max_body: usize) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .fallback(hook::receive_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
