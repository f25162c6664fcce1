//! Error and preflight responses.
//!
//! Client-input failures become `400` with a JSON body naming the failure
//! kind. Gateway and internal failures map to `502`/`504`/`500` with a
//! generic message; their source text is only logged. Every response
//! built here allows any origin.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_REQUEST_HEADERS,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ProxyError;

use super::rewrite::normalize_cors;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

#[must_use]
pub const fn status_for(err: &ProxyError) -> StatusCode {
    match err {
        ProxyError::MissingTarget
        | ProxyError::InvalidEncoding { .. }
        | ProxyError::InvalidTarget { .. } => StatusCode::BAD_REQUEST,
        ProxyError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
        ProxyError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ProxyError::InternalFault { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message safe to show the client.
#[must_use]
pub const fn public_message(err: &ProxyError) -> &'static str {
    match err {
        ProxyError::MissingTarget => "Nothing requested.",
        ProxyError::InvalidEncoding { .. } => "Target encoding is invalid.",
        ProxyError::InvalidTarget { .. } => "URL is invalid.",
        ProxyError::UpstreamUnreachable { .. } => "Upstream unreachable.",
        ProxyError::UpstreamTimeout { .. } => "Upstream timed out.",
        ProxyError::InternalFault { .. } => "Internal error.",
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: public_message(&self).to_string(),
            kind: self.kind().to_string(),
        };
        let mut response = (status_for(&self), Json(body)).into_response();
        normalize_cors(response.headers_mut());
        response
    }
}

/// `204` answer to a CORS preflight. Never touches the target.
pub fn preflight_response(req_headers: &HeaderMap) -> Response {
    let allow_headers = req_headers
        .get(ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    normalize_cors(headers);
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
    response
}

/// `500` JSON body for a request whose handler panicked.
pub fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "request handler panicked");

    ProxyError::InternalFault {
        reason: detail.to_string(),
    }
    .into_response()
}
