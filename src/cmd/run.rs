//! `hookfan run` — start the proxy server.
//!
//! Loads and validates the configuration, starts the Axum HTTP server,
//! and coordinates shutdown: the first SIGINT/SIGTERM closes the
//! listener and drains every route's in-flight forwards before exit; a
//! second signal terminates immediately with a non-zero status.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::RunArgs;
use crate::config;
use crate::error::HookfanError;
use crate::logging;
use crate::metrics::Metrics;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), HookfanError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let config = config::load(&args.config)?;
    let webhook_count = config.webhooks.len();
    let target_count = config.total_targets();

    let metrics = Arc::new(Metrics::new());
    let state = Arc::new(AppState::new(
        config,
        metrics,
        Duration::from_millis(args.timeout),
    ));

    for route in &state.routes {
        tracing::info!(
            path = %route.webhook.path,
            method = %route.webhook.method,
            targets = route.webhook.targets.len(),
            signed = route.webhook.signature.is_some(),
            "registering webhook"
        );
    }

    let router = server::build_router(Arc::clone(&state), args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        webhooks = webhook_count,
        targets = target_count,
        "hookfan started"
    );

    // One task owns signal handling for the whole process: the first
    // signal flips the watch channel that drives graceful shutdown, the
    // second aborts the drain and terminates.
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        server::shutdown_signal().await;
        tracing::info!("shutting down, draining in-flight forwards");
        let _ = shutdown_tx.send(true);

        server::shutdown_signal().await;
        tracing::error!("second shutdown signal received, terminating");
        std::process::exit(1);
    });

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
    })
    .await?;

    // Listener is closed; no new forwards can start. Wait for every
    // route's counter to reach zero before allowing process exit.
    for route in &state.routes {
        let pending = route.in_flight.count();
        if pending > 0 {
            tracing::info!(
                path = %route.webhook.path,
                pending,
                "waiting for forwards to finish"
            );
        }
        route.in_flight.drained().await;
    }

    tracing::info!("hookfan stopped");
    Ok(())
}
