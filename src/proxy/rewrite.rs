//! Upstream response post-processing.
//!
//! [`rewrite_response`] strips hop-by-hop headers, applies the selected
//! [`RedirectPolicy`] to 3xx responses carrying a `Location`, and finally
//! normalizes CORS so the client always sees
//! `Access-Control-Allow-Origin: *`. Bodies stay streaming except for the
//! small JSON body synthesized when a redirect is intercepted.

use axum::body::Body;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, HeaderValue, Response, StatusCode};
use bytes::Bytes;
use serde::Serialize;
use url::Url;

use crate::error::ProxyError;

use super::context::{RedirectPolicy, REDIRECT_PARAM, URL_PARAM};
use super::headers::strip_hop_by_hop;
use super::target::TargetSpec;

/// What the rewriter did with a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectAction {
    /// Not a redirect, or passed through untouched.
    None,
    /// `Location` now loops back through the proxy.
    Rewritten,
    /// Replaced by a `200` JSON body.
    Intercepted,
}

#[derive(Debug)]
pub struct Rewritten {
    pub response: Response<Body>,
    pub action: RedirectAction,
}

#[derive(Serialize)]
struct LocationBody<'a> {
    location: &'a str,
}

pub fn rewrite_response<B>(
    upstream: Response<B>,
    target: &TargetSpec,
    policy: RedirectPolicy,
    public_url: &Url,
) -> Result<Rewritten, ProxyError>
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    let (mut parts, body) = upstream.into_parts();
    strip_hop_by_hop(&mut parts.headers);

    let location = parts
        .status
        .is_redirection()
        .then(|| parts.headers.get(LOCATION).cloned())
        .flatten()
        .filter(|v| !v.is_empty());

    let (mut response, action) = match (location, policy) {
        (Some(location), RedirectPolicy::Follow) => {
            let action = match follow_location(public_url, target, &location) {
                Some(rewritten) => {
                    parts.headers.insert(LOCATION, rewritten);
                    RedirectAction::Rewritten
                }
                None => {
                    tracing::warn!(
                        target = %target,
                        location = ?location,
                        "redirect location cannot be rewritten, passing through"
                    );
                    RedirectAction::None
                }
            };
            (Response::from_parts(parts, Body::new(body)), action)
        }
        (Some(location), RedirectPolicy::Stop) => {
            let location = String::from_utf8_lossy(location.as_bytes());
            (location_response(&location)?, RedirectAction::Intercepted)
        }
        _ => (
            Response::from_parts(parts, Body::new(body)),
            RedirectAction::None,
        ),
    };

    normalize_cors(response.headers_mut());
    Ok(Rewritten { response, action })
}

/// Drop any upstream `Access-Control-Allow-Origin` and allow every origin.
pub fn normalize_cors(headers: &mut HeaderMap) {
    headers.remove(ACCESS_CONTROL_ALLOW_ORIGIN);
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}

/// Location pointing back at the proxy with the redirect target embedded.
///
/// Relative locations are resolved against the target first so the
/// embedded `url` is always absolute.
fn follow_location(
    public_url: &Url,
    target: &TargetSpec,
    location: &HeaderValue,
) -> Option<HeaderValue> {
    let location = location.to_str().ok()?;
    let absolute = target.url().join(location).ok()?;

    let mut url = public_url.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair(REDIRECT_PARAM, "follow")
        .append_pair(URL_PARAM, absolute.as_str());

    HeaderValue::from_str(url.as_str()).ok()
}

/// `200` JSON response reporting a redirect target. No upstream header
/// survives, so stale framing headers cannot leak.
fn location_response(location: &str) -> Result<Response<Body>, ProxyError> {
    let body = serde_json::to_vec(&LocationBody { location }).map_err(|e| {
        ProxyError::InternalFault {
            reason: format!("failed to serialize location body: {e}"),
        }
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .map_err(|e| ProxyError::InternalFault {
            reason: format!("failed to build location response: {e}"),
        })
}
