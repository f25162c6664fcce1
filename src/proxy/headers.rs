//! Header overrides, outbound header construction, and hop-by-hop stripping.
//!
//! [`header_overrides`] turns `h__<Name>=<value>` query parameters into an
//! ordered set of replacements. [`build_forwarded_headers`] clones the
//! original client headers, strips hop-by-hop headers, rewrites `Host`,
//! applies the overrides, and optionally presents the request as
//! same-origin to the target.

use std::sync::LazyLock;

use axum::http::header::{CONNECTION, HOST, ORIGIN, REFERER};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use super::target::TargetSpec;

/// Query-key prefix that marks a header override.
pub const HEADER_MARKER: &str = "h__";

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "proxy-connection",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// Ordered header replacements taken from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOverrides {
    entries: Vec<(HeaderName, Vec<HeaderValue>)>,
}

impl HeaderOverrides {
    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn iter(&self) -> impl Iterator<Item = (&HeaderName, &[HeaderValue])> {
        self.entries.iter().map(|(name, values)| (name, values.as_slice()))
    }

    #[must_use]
    pub fn contains(&self, name: &HeaderName) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    fn push(&mut self, name: HeaderName, value: HeaderValue) {
        if let Some((_, values)) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            if !values.contains(&value) {
                values.push(value);
            }
        } else {
            self.entries.push((name, vec![value]));
        }
    }

    /// Replace each overridden header in `headers` with the override values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, values) in &self.entries {
            headers.remove(name);
            for value in values {
                headers.append(name.clone(), value.clone());
            }
        }
    }
}

/// Collect every `h__`-prefixed query parameter into [`HeaderOverrides`].
///
/// Invalid header names or values are skipped with a warning.
#[must_use]
pub fn header_overrides(query: &[(String, String)]) -> HeaderOverrides {
    let mut overrides = HeaderOverrides::default();

    for (key, value) in query {
        let Some(name) = key.strip_prefix(HEADER_MARKER) else {
            continue;
        };
        match (name.parse::<HeaderName>(), HeaderValue::from_str(value)) {
            (Ok(name), Ok(val)) => overrides.push(name, val),
            _ => {
                tracing::warn!(param = %key, "invalid header override, skipping");
            }
        }
    }

    overrides
}

/// Remove the fixed hop-by-hop set plus any header named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| name.trim().parse::<HeaderName>().ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }

    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

pub fn build_forwarded_headers(
    original: &HeaderMap,
    target: &TargetSpec,
    overrides: &HeaderOverrides,
    spoof_origin: bool,
) -> HeaderMap {
    let mut headers = original.clone();
    strip_hop_by_hop(&mut headers);

    if let Ok(val) = HeaderValue::from_str(&target.authority()) {
        headers.insert(HOST, val);
    }

    overrides.apply(&mut headers);

    if spoof_origin {
        let origin = target.origin();
        if !overrides.contains(&ORIGIN) {
            if let Ok(val) = HeaderValue::from_str(&origin) {
                headers.insert(ORIGIN, val);
            }
        }
        if !headers.contains_key(REFERER) {
            if let Ok(val) = HeaderValue::from_str(&format!("{origin}/")) {
                headers.insert(REFERER, val);
            }
        }
    }

    headers
}
