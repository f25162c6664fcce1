//! cors-proxy is a CORS-anonymizing HTTP reverse proxy.
//!
//! A client names a target with the `url` (or base64-encoded `base64`)
//! query parameter. The proxy fetches it with the original method, body,
//! and headers (plus any `h__<Header>` overrides), then relays the
//! response with `Access-Control-Allow-Origin: *`. Redirects can be
//! passed through, looped back through the proxy (`redirection=follow`),
//! or reported as JSON (`redirection=stop`).
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, health).
//! - [`config`] -- Immutable runtime configuration.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /health` and `GET /favicon.ico` handlers.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- Core pipeline: target resolution, header overrides,
//!   forwarding, response rewriting, and error responses.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `sentry-integration` | Sentry error tracking |
//! | `full` | All features |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod proxy;
pub mod server;

#[cfg(feature = "sentry-integration")]
pub mod sentry_integration;
