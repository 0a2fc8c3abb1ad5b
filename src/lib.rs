//! Hookfan is a webhook fan-out proxy.
//!
//! It receives webhook events over HTTP, replies to the sender immediately
//! with a configured synthetic response, and forwards a copy of each event
//! to every configured target concurrently. Forwarding is fire-and-forget:
//! a failed delivery is logged and counted, never retried. On shutdown the
//! listener closes first, then every route drains its in-flight forwards
//! before the process exits.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, validate).
//! - [`config`] -- Configuration loading and static validation.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`hook`] -- Core webhook handling: request validation, signature
//!   checks, concurrent forwarding, and the in-flight drain barrier.
//! - [`logging`] -- Structured tracing setup with JSON and pretty output.
//! - [`metrics`] -- Prometheus counter families and the `/metrics` endpoint.
//! - [`server`] -- Axum server setup, shared application state, HTTP client,
//!   and shutdown signal handling.

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod hook;
pub mod logging;
pub mod metrics;
pub mod server;
