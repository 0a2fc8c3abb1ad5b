//! Prometheus counter families and the `/metrics` endpoint.
//!
//! [`Metrics`] is an injectable handle constructed once at startup and
//! shared through [`AppState`](crate::server::AppState) — there is no
//! process-wide registry, so tests can build their own sink. Three counter
//! families are exposed:
//!
//! - `webhook_requests_received_total{webhook, status}`
//! - `webhook_requests_forwarded_total{webhook, target, status}`
//! - `webhook_requests_processed_total{webhook, target, success}`

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

use crate::server::AppState;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ReceivedLabels {
    /// Webhook path the request was routed to.
    pub webhook: String,
    /// HTTP status returned to the sender.
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ForwardedLabels {
    pub webhook: String,
    /// Target URL the event was forwarded to.
    pub target: String,
    /// HTTP status received from the target.
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ProcessedLabels {
    pub webhook: String,
    pub target: String,
    /// "true" when the target answered 2xx, "false" otherwise.
    pub success: String,
}

pub struct Metrics {
    registry: Registry,
    received: Family<ReceivedLabels, Counter>,
    forwarded: Family<ForwardedLabels, Counter>,
    processed: Family<ProcessedLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let received = Family::<ReceivedLabels, Counter>::default();
        registry.register(
            "webhook_requests_received",
            "The total number of requests received",
            received.clone(),
        );

        let forwarded = Family::<ForwardedLabels, Counter>::default();
        registry.register(
            "webhook_requests_forwarded",
            "The total number of requests forwarded",
            forwarded.clone(),
        );

        let processed = Family::<ProcessedLabels, Counter>::default();
        registry.register(
            "webhook_requests_processed",
            "The total number of requests processed",
            processed.clone(),
        );

        Self {
            registry,
            received,
            forwarded,
            processed,
        }
    }

    pub fn inc_received(&self, webhook: &str, status: u16) {
        self.received
            .get_or_create(&ReceivedLabels {
                webhook: webhook.to_string(),
                status: status.to_string(),
            })
            .inc();
    }

    pub fn inc_forwarded(&self, webhook: &str, target: &str, status: u16) {
        self.forwarded
            .get_or_create(&ForwardedLabels {
                webhook: webhook.to_string(),
                target: target.to_string(),
                status: status.to_string(),
            })
            .inc();
    }

    pub fn inc_processed(&self, webhook: &str, target: &str, success: bool) {
        self.processed
            .get_or_create(&ProcessedLabels {
                webhook: webhook.to_string(),
                target: target.to_string(),
                success: success.to_string(),
            })
            .inc();
    }

    /// Render the registry in OpenMetrics text format.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            [(
                header::CONTENT_TYPE,
                "application/openmetrics-text; version=1.0.0; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
