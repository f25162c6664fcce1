//! Unified error types for cors-proxy.
//!
//! Defines [`CorsProxyError`] (process-level failures surfaced by the
//! CLI) and [`ProxyError`] (the per-request pipeline taxonomy). Both use
//! `thiserror` for `Display` and `Error` derives. Conversion of a
//! [`ProxyError`] into an HTTP response lives in
//! [`proxy::respond`](crate::proxy::respond).

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CorsProxyError {
    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid public URL '{url}': {reason}")]
    InvalidPublicUrl { url: String, reason: String },

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

/// Failure of a single proxied request.
///
/// The first three variants are client-input errors, detected before any
/// outbound I/O. The rest are gateway or internal failures whose source
/// text is logged but never sent to the client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProxyError {
    #[error("no target URL supplied")]
    MissingTarget,

    #[error("target encoding is invalid: {reason}")]
    InvalidEncoding { reason: String },

    #[error("target URL '{url}' is invalid: {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("upstream unreachable: {source}")]
    UpstreamUnreachable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("upstream did not respond within {timeout_ms}ms")]
    UpstreamTimeout { timeout_ms: u64 },

    #[error("internal fault: {reason}")]
    InternalFault { reason: String },
}

impl ProxyError {
    /// Stable machine-readable name of the failure kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingTarget => "missing_target",
            Self::InvalidEncoding { .. } => "invalid_encoding",
            Self::InvalidTarget { .. } => "invalid_target",
            Self::UpstreamUnreachable { .. } => "upstream_unreachable",
            Self::UpstreamTimeout { .. } => "upstream_timeout",
            Self::InternalFault { .. } => "internal_fault",
        }
    }

    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingTarget | Self::InvalidEncoding { .. } | Self::InvalidTarget { .. }
        )
    }
}
