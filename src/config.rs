//! Immutable runtime configuration.
//!
//! [`ProxyConfig`] is resolved once from the `run` arguments and shared
//! read-only by every request handler through
//! [`AppState`](crate::server::AppState).

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::cli::RunArgs;
use crate::error::CorsProxyError;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_BODY: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Base URL under which clients reach this proxy. Rewritten redirect
    /// locations point back here.
    pub public_url: Url,
    pub timeout: Duration,
    /// Present the outbound request as same-origin to the target.
    pub spoof_origin: bool,
    pub favicon_path: PathBuf,
}

impl ProxyConfig {
    #[must_use]
    pub fn new(public_url: Url) -> Self {
        Self {
            public_url,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            spoof_origin: false,
            favicon_path: PathBuf::from("favicon.ico"),
        }
    }

    pub fn from_args(args: &RunArgs) -> Result<Self, CorsProxyError> {
        let raw = args
            .public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", args.host, args.port));

        Ok(Self {
            public_url: parse_public_url(&raw)?,
            timeout: Duration::from_millis(args.timeout),
            spoof_origin: args.spoof_origin,
            favicon_path: args.favicon.clone(),
        })
    }

    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Parse and validate the public base URL.
///
/// Must be an absolute `http` or `https` URL with a host. Any query or
/// fragment is dropped; the proxy appends its own query when rewriting.
pub fn parse_public_url(raw: &str) -> Result<Url, CorsProxyError> {
    let invalid = |reason: &str| CorsProxyError::InvalidPublicUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
