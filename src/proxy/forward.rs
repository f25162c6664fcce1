//! Outbound round trip to the resolved target.
//!
//! [`forward`] sends the original method and streaming body to the
//! target with rewritten headers, bounded by the configured timeout.
//! The timeout also applies between frames of the upstream body, so a
//! target that stalls after sending headers cannot pin the connection.
//! Failures are reported once and never retried. Dropping the returned
//! future (client disconnect) cancels the in-flight request.

use std::time::{Duration, Instant};

use axum::body::Body;
use hyper::body::Incoming;
use hyper::Response;
use tower_http::timeout::TimeoutBody;

use crate::error::ProxyError;
use crate::server::HttpClient;

use super::context::RequestContext;
use super::headers::{build_forwarded_headers, HeaderOverrides};
use super::target::TargetSpec;

pub struct ForwardRequest<'a> {
    pub client: &'a HttpClient,
    pub ctx: &'a RequestContext,
    pub target: &'a TargetSpec,
    pub overrides: &'a HeaderOverrides,
    pub body: Body,
    pub timeout: Duration,
    pub spoof_origin: bool,
}

#[allow(clippy::cast_possible_truncation)]
pub async fn forward(
    req: ForwardRequest<'_>,
) -> Result<Response<TimeoutBody<Incoming>>, ProxyError> {
    let uri: hyper::Uri =
        req.target
            .request_uri()
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| ProxyError::InvalidTarget {
                url: req.target.to_string(),
                reason: e.to_string(),
            })?;

    let headers = build_forwarded_headers(
        &req.ctx.headers,
        req.target,
        req.overrides,
        req.spoof_origin,
    );

    let mut outbound = hyper::Request::builder()
        .method(req.ctx.method.clone())
        .uri(uri)
        .body(req.body)
        .map_err(|e| ProxyError::InternalFault {
            reason: format!("failed to build outbound request: {e}"),
        })?;
    *outbound.headers_mut() = headers;

    tracing::info!(
        correlation_id = %req.ctx.correlation_id,
        method = %req.ctx.method,
        target = %req.target,
        overrides = req.overrides.len(),
        "forwarding request"
    );

    let start = Instant::now();
    let result = tokio::time::timeout(req.timeout, req.client.request(outbound)).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(response)) => {
            tracing::info!(
                correlation_id = %req.ctx.correlation_id,
                target = %req.target,
                status = response.status().as_u16(),
                latency_ms,
                "target responded"
            );
            let timeout = req.timeout;
            Ok(response.map(|body| TimeoutBody::new(timeout, body)))
        }
        Ok(Err(e)) => {
            tracing::warn!(
                correlation_id = %req.ctx.correlation_id,
                target = %req.target,
                error = %e,
                latency_ms,
                "target unreachable"
            );
            Err(ProxyError::UpstreamUnreachable {
                source: Box::new(e),
            })
        }
        Err(_) => {
            let timeout_ms = req.timeout.as_millis() as u64;
            tracing::warn!(
                correlation_id = %req.ctx.correlation_id,
                target = %req.target,
                timeout_ms,
                "target timed out"
            );
            Err(ProxyError::UpstreamTimeout { timeout_ms })
        }
    }
}
