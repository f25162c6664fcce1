//! Optional Sentry error tracking integration.
//!
//! Initializes the Sentry SDK with the provided DSN and environment.
//! The returned guard must be held for the lifetime of the server so
//! that handler panics caught by the router are still reported.

pub fn init(dsn: &str, environment: Option<&str>) -> sentry::ClientInitGuard {
    let parsed_dsn = dsn
        .parse::<sentry::types::Dsn>()
        .map_err(|e| tracing::warn!(error = %e, "invalid Sentry DSN, error tracking disabled"))
        .ok();

    let guard = sentry::init(sentry::ClientOptions {
        dsn: parsed_dsn,
        environment: environment.map(|e| e.to_string().into()),
        release: Some(concat!(env!("CARGO_PKG_NAME"), "@", env!("CARGO_PKG_VERSION")).into()),
        ..Default::default()
    });

    if guard.is_enabled() {
        tracing::info!(environment = environment.unwrap_or("default"), "sentry enabled");
    }
    guard
}
