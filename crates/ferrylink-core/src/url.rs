use crate::config::AllowList;
use crate::error::NormalizeError;
use serde::{Serialize, Serializer};
use std::fmt::Display;
use url::Url;

/// An absolute `http(s)` URL whose host is on the allow-list.
///
/// This is the only type accepted as a cache key, fetch target or short-link
/// target. Construction fails closed on any other host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    /// Canonicalizes a user-supplied string and enforces the allow-list.
    ///
    /// The input is trimmed and given an `https://` prefix when it carries no
    /// scheme. Beyond what the URL parser does (lowercasing scheme and host,
    /// resolving dot segments) no canonicalization happens, so two URLs that
    /// differ only in query parameter order stay distinct.
    pub fn parse(raw: &str, allow_list: &AllowList) -> Result<Self, NormalizeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NormalizeError::Malformed("empty url".to_string()));
        }

        let candidate = if has_scheme(trimmed) {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let url =
            Url::parse(&candidate).map_err(|e| NormalizeError::Malformed(format!("{raw}: {e}")))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(NormalizeError::Malformed(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| NormalizeError::Malformed(format!("{raw}: missing host")))?;

        if !allow_list.contains(host) {
            return Err(NormalizeError::HostNotAllowed(host.to_string()));
        }

        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// The last non-empty path segment, still percent-encoded.
    pub fn last_segment(&self) -> Option<&str> {
        self.0
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

/// Reports whether `s` starts with `scheme://`, where the scheme is an ASCII
/// letter followed by letters, digits, `+`, `-` or `.`.
fn has_scheme(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl Display for NormalizedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for NormalizedUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
