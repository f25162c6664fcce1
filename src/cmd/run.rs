//! `cors-proxy run` — start the proxy server.
//!
//! Resolves the immutable [`ProxyConfig`], starts the Axum HTTP server,
//! and waits for Ctrl+C / SIGTERM to shut down gracefully.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::ProxyConfig;
use crate::error::CorsProxyError;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), CorsProxyError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    #[cfg(feature = "sentry-integration")]
    let _sentry_guard = args
        .sentry_dsn
        .as_ref()
        .map(|dsn| crate::sentry_integration::init(dsn, args.sentry_environment.as_deref()));

    let config = ProxyConfig::from_args(&args)?;
    let public_url = config.public_url.clone();
    let timeout_ms = config.timeout_ms();

    let state = Arc::new(AppState::new(config));
    let router = server::build_router(state, args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        public_url = %public_url,
        timeout_ms,
        spoof_origin = args.spoof_origin,
        "cors-proxy started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("cors-proxy stopped");
    Ok(())
}
