//! Target resolution from the query string.
//!
//! [`resolve_target`] accepts either a literal `url` parameter or a
//! standard-alphabet `base64` parameter and yields an absolute
//! [`TargetSpec`]. Relative, host-less, or unparsable targets are
//! rejected before any outbound I/O happens.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use url::Url;

use crate::error::ProxyError;

use super::context::{RequestContext, BASE64_PARAM, URL_PARAM};

/// Absolute URL a request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    url: Url,
}

impl TargetSpec {
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// `host[:port]` as it should appear in the outbound `Host` header.
    #[must_use]
    pub fn authority(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        self.url
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"))
    }

    /// `scheme://host[:port]` of the target.
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Target as sent on the wire: fragments never leave the client.
    #[must_use]
    pub fn request_uri(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.into()
    }
}

impl std::fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

pub fn resolve_target(ctx: &RequestContext) -> Result<TargetSpec, ProxyError> {
    let raw = if let Some(literal) = ctx.first(URL_PARAM).filter(|v| !v.is_empty()) {
        literal.to_string()
    } else if let Some(encoded) = ctx.first(BASE64_PARAM).filter(|v| !v.is_empty()) {
        decode_base64_target(encoded)?
    } else {
        return Err(ProxyError::MissingTarget);
    };

    parse_target(&raw)
}

/// Decode a base64-encoded target.
///
/// An unescaped `+` in a query string decodes to a space, so spaces are
/// mapped back before decoding.
pub fn decode_base64_target(encoded: &str) -> Result<String, ProxyError> {
    let normalized = encoded.trim().replace(' ', "+");
    let bytes = BASE64
        .decode(normalized.as_bytes())
        .map_err(|e| ProxyError::InvalidEncoding {
            reason: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| ProxyError::InvalidEncoding {
        reason: e.to_string(),
    })
}

pub fn parse_target(raw: &str) -> Result<TargetSpec, ProxyError> {
    let invalid = |reason: String| ProxyError::InvalidTarget {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.scheme().is_empty() || url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("target must be absolute".into()));
    }
    Ok(TargetSpec { url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, Method};

    fn ctx(query: &str) -> RequestContext {
        RequestContext::new(
            Method::GET,
            &format!("/?{query}").parse().unwrap(),
            HeaderMap::new(),
        )
    }

    fn encoded(s: &str) -> String {
        url::form_urlencoded::byte_serialize(BASE64.encode(s).as_bytes()).collect()
    }

    #[test]
    fn literal_url_is_used() {
        let target = resolve_target(&ctx("url=https://example.com/a?b=c")).unwrap();
        assert_eq!(target.url().as_str(), "https://example.com/a?b=c");
    }

    #[test]
    fn literal_wins_over_base64() {
        let q = format!("url=https://a.example&base64={}", encoded("https://b.example"));
        let target = resolve_target(&ctx(&q)).unwrap();
        assert_eq!(target.url().host_str(), Some("a.example"));
    }

    #[test]
    fn base64_target_matches_literal() {
        for s in [
            "https://example.com/path?x=1",
            "http://localhost:8080/",
            "/relative/path",
            "not a url",
            "mailto:someone@example.com",
        ] {
            let literal = resolve_target(&ctx(&format!(
                "url={}",
                url::form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>()
            )));
            let b64 = resolve_target(&ctx(&format!("base64={}", encoded(s))));
            match (literal, b64) {
                (Ok(a), Ok(b)) => assert_eq!(a, b),
                (Err(a), Err(b)) => assert_eq!(a.kind(), b.kind()),
                (a, b) => panic!("mismatch for {s}: {a:?} vs {b:?}"),
            }
        }
    }

    #[test]
    fn unescaped_plus_in_base64_survives() {
        // "https://example.com/?>>>" encodes with a '+'
        let raw = BASE64.encode("https://example.com/?>>>");
        assert!(raw.contains('+'));
        let target = resolve_target(&ctx(&format!("base64={raw}"))).unwrap();
        assert_eq!(target.url().host_str(), Some("example.com"));
    }

    #[test]
    fn missing_target_regardless_of_other_params() {
        let err = resolve_target(&ctx("h__Accept=text/html&redirection=stop")).unwrap_err();
        assert!(matches!(err, ProxyError::MissingTarget));

        let err = resolve_target(&ctx("")).unwrap_err();
        assert!(matches!(err, ProxyError::MissingTarget));
    }

    #[test]
    fn empty_url_falls_through_to_missing() {
        let err = resolve_target(&ctx("url=")).unwrap_err();
        assert!(matches!(err, ProxyError::MissingTarget));
    }

    #[test]
    fn bad_base64_is_invalid_encoding() {
        let err = resolve_target(&ctx("base64=***")).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidEncoding { .. }));
    }

    #[test]
    fn non_utf8_base64_is_invalid_encoding() {
        let raw = BASE64.encode([0xff, 0xfe, 0xfd]);
        let err = decode_base64_target(&raw).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidEncoding { .. }));
    }

    #[test]
    fn relative_url_is_invalid() {
        let err = resolve_target(&ctx("url=/foo/bar")).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidTarget { .. }));
    }

    #[test]
    fn hostless_url_is_invalid() {
        let err = parse_target("mailto:someone@example.com").unwrap_err();
        assert!(matches!(err, ProxyError::InvalidTarget { .. }));
    }

    #[test]
    fn authority_and_origin() {
        let target = parse_target("http://backend:9090/path").unwrap();
        assert_eq!(target.authority(), "backend:9090");
        assert_eq!(target.origin(), "http://backend:9090");

        let target = parse_target("https://example.com/x").unwrap();
        assert_eq!(target.authority(), "example.com");
        assert_eq!(target.origin(), "https://example.com");
    }
}
