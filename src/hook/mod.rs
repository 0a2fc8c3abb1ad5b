//! Core webhook request handling.
//!
//! [`receive_handler`] is the Axum fallback that receives every
//! non-`/metrics` request, looks up the webhook configured for the exact
//! path, validates the method and (optionally) the HMAC signature, spawns
//! one detached forward task per target, and answers the sender with the
//! configured synthetic response without waiting for any forward.
//! Submodules handle the in-flight drain barrier ([`drain`]), single
//! forward attempts ([`forward`]), and signature checks ([`signature`]).

pub mod drain;
pub mod forward;
pub mod signature;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;

use crate::server::AppState;

pub async fn receive_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();

    let Some(route) = state.route(path) else {
        tracing::warn!(method = %parts.method, path = %path, "no webhook matched");
        return StatusCode::NOT_FOUND.into_response();
    };
    let webhook = &route.webhook;

    let correlation_id = parts
        .headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    if !parts.method.as_str().eq_ignore_ascii_case(&webhook.method) {
        tracing::error!(
            correlation_id = %correlation_id,
            webhook = %webhook.path,
            received = %parts.method,
            expected = %webhook.method,
            "invalid request received"
        );
        state.metrics.inc_received(&webhook.path, 400);
        return StatusCode::BAD_REQUEST.into_response();
    }

    // The body is read once; every forward reuses the same bytes.
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::error!(
                correlation_id = %correlation_id,
                webhook = %webhook.path,
                error = %e,
                "unable to read event body"
            );
            state.metrics.inc_received(&webhook.path, 400);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    // Signature verification gates the request: an unauthenticated event
    // is rejected before any forward is attempted.
    if let Some(ref spec) = webhook.signature {
        let provided = parts
            .headers
            .get(spec.header_name.as_str())
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !signature::verify(spec, &body, provided) {
            tracing::warn!(
                correlation_id = %correlation_id,
                webhook = %webhook.path,
                header = %spec.header_name,
                "signature verification failed"
            );
            state.metrics.inc_received(&webhook.path, 401);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    tracing::info!(
        correlation_id = %correlation_id,
        webhook = %webhook.path,
        targets = webhook.targets.len(),
        "event received"
    );

    // The sender must never wait on downstream latency, so every target
    // gets a detached task. The in-flight count is incremented before the
    // spawn: a shutdown arriving in between still waits for this forward.
    let client_ip = addr.ip().to_string();
    let forward_headers = forward::build_forward_headers(&parts.headers, &client_ip, &correlation_id);

    for target in &webhook.targets {
        let guard = Arc::clone(&route.in_flight).start();
        let forward_request = forward::ForwardRequest {
            client: state.http_client.clone(),
            metrics: Arc::clone(&state.metrics),
            webhook_path: webhook.path.clone(),
            target: target.clone(),
            method: parts.method.clone(),
            headers: forward_headers.clone(),
            body: body.clone(),
            timeout: state.forward_timeout,
            correlation_id: correlation_id.clone(),
        };

        tokio::spawn(async move {
            // Dropping the guard decrements the in-flight count on every
            // exit path, including a panic inside forward().
            let _guard = guard;
            let ok = forward::forward(&forward_request).await;
            forward_request.metrics.inc_processed(
                &forward_request.webhook_path,
                &forward_request.target,
                ok,
            );
        });
    }

    synthetic_response(&state, route)
}

/// Build the configured reply for the sender and count it.
fn synthetic_response(state: &AppState, route: &crate::server::RouteState) -> Response {
    let webhook = &route.webhook;
    let code =
        StatusCode::from_u16(webhook.response.code).unwrap_or(StatusCode::NO_CONTENT);

    state.metrics.inc_received(&webhook.path, code.as_u16());

    let mut builder = Response::builder().status(code);
    for header in &webhook.response.headers {
        builder = builder.header(header.name.as_str(), header.resolve());
    }

    builder
        .body(Body::from(webhook.response.body.clone()))
        .unwrap_or_else(|e| {
            tracing::error!(
                webhook = %webhook.path,
                error = %e,
                "failed to build configured response"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}
