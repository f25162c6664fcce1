//! Per-request context shared by every pipeline stage.
//!
//! [`RequestContext`] is built once from the incoming request and is
//! never mutated afterwards. Each stage borrows what it needs from it
//! instead of capturing enclosing state.

use axum::http::{HeaderMap, Method, Uri};

pub const URL_PARAM: &str = "url";
pub const BASE64_PARAM: &str = "base64";
pub const REDIRECT_PARAM: &str = "redirection";

/// How a 3xx upstream response with a `Location` is handed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    /// Location passes through unmodified.
    #[default]
    Transparent,
    /// Location is rewritten to loop back through this proxy.
    Follow,
    /// Redirect is converted into a `200` JSON body naming the location.
    Stop,
}

impl RedirectPolicy {
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("follow") || v.eq_ignore_ascii_case("passthrough") => {
                Self::Follow
            }
            Some(v) if v.eq_ignore_ascii_case("stop") => Self::Stop,
            _ => Self::Transparent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Decoded query pairs in arrival order. Keys may repeat.
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub redirect: RedirectPolicy,
    pub correlation_id: String,
}

impl RequestContext {
    #[must_use]
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap) -> Self {
        let query = parse_query(uri.query());
        let redirect = RedirectPolicy::from_query(first_value(&query, REDIRECT_PARAM));
        let correlation_id = headers
            .get("x-correlation-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

        Self {
            method,
            query,
            headers,
            redirect,
            correlation_id,
        }
    }

    /// First value of `key`, mirroring the usual single-value lookup.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        first_value(&self.query, key)
    }
}

#[must_use]
pub fn parse_query(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn first_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
