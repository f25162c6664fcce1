//! Core CORS-anonymizing proxy handler.
//!
//! The [`forward_handler`] function is the Axum fallback that receives
//! every request not claimed by an auxiliary route. It builds a
//! [`RequestContext`](context::RequestContext), resolves the target
//! ([`target`]), collects header overrides ([`headers`]), performs the
//! outbound round trip ([`forward`]), and rewrites the upstream response
//! ([`rewrite`]). Failures are rendered by [`respond`].

pub mod context;
pub mod forward;
pub mod headers;
pub mod respond;
pub mod rewrite;
pub mod target;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;
use crate::server::AppState;

use context::RequestContext;
use rewrite::RedirectAction;

pub async fn forward_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    body: Body,
) -> Response {
    if method == Method::OPTIONS {
        return respond::preflight_response(&req_headers);
    }

    let ctx = RequestContext::new(method, &uri, req_headers);

    let mut response = match proxy_request(&state, &ctx, body).await {
        Ok(response) => response,
        Err(e) => {
            if e.is_client_error() {
                tracing::info!(
                    correlation_id = %ctx.correlation_id,
                    kind = e.kind(),
                    error = %e,
                    "rejected request"
                );
            } else {
                state.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    correlation_id = %ctx.correlation_id,
                    kind = e.kind(),
                    error = %e,
                    "proxy request failed"
                );
            }
            e.into_response()
        }
    };

    if let Ok(val) = HeaderValue::from_str(&ctx.correlation_id) {
        response.headers_mut().insert("x-correlation-id", val);
    }
    response
}

async fn proxy_request(
    state: &AppState,
    ctx: &RequestContext,
    body: Body,
) -> Result<Response, ProxyError> {
    let target = target::resolve_target(ctx)?;
    let overrides = headers::header_overrides(&ctx.query);

    let upstream = forward::forward(forward::ForwardRequest {
        client: &state.http_client,
        ctx,
        target: &target,
        overrides: &overrides,
        body,
        timeout: state.config.timeout,
        spoof_origin: state.config.spoof_origin,
    })
    .await?;

    let rewritten =
        rewrite::rewrite_response(upstream, &target, ctx.redirect, &state.config.public_url)?;

    state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
    if rewritten.action == RedirectAction::Intercepted {
        state
            .stats
            .redirects_intercepted
            .fetch_add(1, Ordering::Relaxed);
    }

    Ok(rewritten.response)
}
