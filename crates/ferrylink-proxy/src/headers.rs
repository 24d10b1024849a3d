//! Response header policy shared by every proxied or cached response.

use http::header::{
    HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS,
    CONNECTION, RANGE, STRICT_TRANSPORT_SECURITY, TRANSFER_ENCODING, USER_AGENT,
};
use http::HeaderMap;

pub const CACHE_STATUS: HeaderName = HeaderName::from_static("x-cache-status");
pub const SERVED_BY: HeaderName = HeaderName::from_static("x-served-by");

const LINK: HeaderName = HeaderName::from_static("link");
const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

/// The only client request headers passed upstream.
pub const FORWARDED_REQUEST_HEADERS: [HeaderName; 4] = [RANGE, USER_AGENT, ACCEPT, ACCEPT_ENCODING];

/// Upstream response headers never relayed: GitHub's pagination and HSTS
/// semantics, plus hop-by-hop framing.
pub const STRIPPED_RESPONSE_HEADERS: [HeaderName; 5] = [
    LINK,
    STRICT_TRANSPORT_SECURITY,
    CONNECTION,
    KEEP_ALIVE,
    TRANSFER_ENCODING,
];

/// Outcome of the cache lookup, reported in [`CACHE_STATUS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

/// Adds the static CORS headers, replacing any upstream values.
pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, HEAD, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Range"),
    );
    headers.insert(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(
            "Content-Disposition, Content-Length, Content-Range, X-Cache-Status",
        ),
    );
}

pub fn strip_upstream_headers(headers: &mut HeaderMap) {
    for name in &STRIPPED_RESPONSE_HEADERS {
        headers.remove(name);
    }
}

/// Copies the forwarded subset of `incoming`, then pins the User-Agent.
pub fn upstream_request_headers(incoming: &HeaderMap, user_agent: &str) -> HeaderMap {
    let mut outgoing = HeaderMap::new();
    for name in &FORWARDED_REQUEST_HEADERS {
        for value in incoming.get_all(name) {
            outgoing.append(name.clone(), value.clone());
        }
    }
    if let Ok(user_agent) = HeaderValue::from_str(user_agent) {
        outgoing.insert(USER_AGENT, user_agent);
    }
    outgoing
}
