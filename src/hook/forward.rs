//! One forward attempt: deliver a copy of an event to a single target.
//!
//! Each attempt builds an outbound request with the original method and
//! body, the prepared forward headers, and a bounded timeout. Failure is
//! terminal for the attempt — a transport error, timeout, or non-2xx
//! response is logged and counted, never retried. The in-flight guard is
//! held by the spawning task, not here, so the drain contract is
//! independent of this function's exit path.

use std::sync::Arc;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use bytes::Bytes;
use http_body_util::Full;

use crate::metrics::Metrics;
use crate::server::HttpClient;

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// Everything one forward task needs, owned so the task can be detached.
pub struct ForwardRequest {
    pub client: HttpClient,
    pub metrics: Arc<Metrics>,
    pub webhook_path: String,
    pub target: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub timeout: Duration,
    pub correlation_id: String,
}

/// Prepare the header set shared by all of a request's forwards.
///
/// Clones the sender's headers, strips hop-by-hop headers plus `host`
/// and `content-length` (both are recomputed for the outbound request),
/// appends the client address to the `x-forwarded-for` chain, and tags
/// the event with its correlation id.
#[must_use]
pub fn build_forward_headers(
    original: &HeaderMap,
    client_ip: &str,
    correlation_id: &str,
) -> HeaderMap {
    let mut headers = original.clone();

    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    if !client_ip.is_empty() {
        let xff = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map_or_else(
                || client_ip.to_string(),
                |existing| format!("{existing}, {client_ip}"),
            );
        if let Ok(val) = HeaderValue::from_str(&xff) {
            headers.insert("x-forwarded-for", val);
        }
    }

    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        headers.insert("x-correlation-id", val);
    }

    headers
}

/// Send one event copy to one target. Returns `true` on a 2xx response.
pub async fn forward(req: &ForwardRequest) -> bool {
    let start = Instant::now();

    let mut builder = hyper::Request::builder()
        .method(req.method.clone())
        .uri(req.target.clone());
    for (key, value) in &req.headers {
        builder = builder.header(key, value);
    }

    let outbound = match builder.body(Full::new(req.body.clone())) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(
                correlation_id = %req.correlation_id,
                webhook = %req.webhook_path,
                target = %req.target,
                error = %e,
                "unable to build forward request"
            );
            return false;
        }
    };

    let result = tokio::time::timeout(req.timeout, req.client.request(outbound)).await;
    #[allow(clippy::cast_possible_truncation)]
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(response)) => {
            let status = response.status();
            req.metrics
                .inc_forwarded(&req.webhook_path, &req.target, status.as_u16());

            if status.is_success() {
                tracing::debug!(
                    correlation_id = %req.correlation_id,
                    webhook = %req.webhook_path,
                    target = %req.target,
                    status = status.as_u16(),
                    latency_ms,
                    "target accepted event"
                );
                true
            } else {
                tracing::warn!(
                    correlation_id = %req.correlation_id,
                    webhook = %req.webhook_path,
                    target = %req.target,
                    status = status.as_u16(),
                    latency_ms,
                    "unexpected status from target"
                );
                false
            }
        }
        Ok(Err(e)) => {
            tracing::warn!(
                correlation_id = %req.correlation_id,
                webhook = %req.webhook_path,
                target = %req.target,
                error = %e,
                latency_ms,
                "unable to reach target"
            );
            false
        }
        Err(_) => {
            tracing::warn!(
                correlation_id = %req.correlation_id,
                webhook = %req.webhook_path,
                target = %req.target,
                latency_ms,
                "forward timed out"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hop_by_hop_and_host() {
        let mut original = HeaderMap::new();
        original.insert("connection", "keep-alive".parse().unwrap());
        original.insert("host", "hookfan.internal".parse().unwrap());
        original.insert("content-length", "20".parse().unwrap());
        original.insert("content-type", "application/json".parse().unwrap());

        let result = build_forward_headers(&original, "10.0.0.1", "test-id");

        assert!(result.get("connection").is_none());
        assert!(result.get("host").is_none());
        assert!(result.get("content-length").is_none());
        assert!(result.get("content-type").is_some());
    }

    #[test]
    fn appends_x_forwarded_for() {
        let mut original = HeaderMap::new();
        original.insert("x-forwarded-for", "1.2.3.4".parse().unwrap());

        let result = build_forward_headers(&original, "10.0.0.1", "test-id");
        assert_eq!(result.get("x-forwarded-for").unwrap(), "1.2.3.4, 10.0.0.1");
    }

    #[test]
    fn starts_x_forwarded_for_chain() {
        let result = build_forward_headers(&HeaderMap::new(), "10.0.0.1", "test-id");
        assert_eq!(result.get("x-forwarded-for").unwrap(), "10.0.0.1");
    }

    #[test]
    fn unknown_client_ip_adds_nothing() {
        let result = build_forward_headers(&HeaderMap::new(), "", "test-id");
        assert!(result.get("x-forwarded-for").is_none());
    }

    #[test]
    fn sets_correlation_id() {
        let result = build_forward_headers(&HeaderMap::new(), "10.0.0.1", "my-correlation-id");
        assert_eq!(result.get("x-correlation-id").unwrap(), "my-correlation-id");
    }
}
