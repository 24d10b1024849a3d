use std::sync::Arc;
use std::time::Duration;
use typed_builder::TypedBuilder;

/// Hosts the relay serves out of the box.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    "github.com",
    "raw.githubusercontent.com",
    "objects.githubusercontent.com",
    "releases.githubusercontent.com",
    "gist.githubusercontent.com",
];

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_CODE_ATTEMPTS: usize = 5;
pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(365 * 24 * 60 * 60);
pub const DEFAULT_MAX_CACHEABLE_BYTES: u64 = 64 * 1024 * 1024;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; ferrylink/0.1; +https://github.com)";
pub const DEFAULT_PRODUCT: &str = "ferrylink";

/// The fixed set of hostnames permitted as proxy, probe and shorten targets.
///
/// Entries are stored lowercased; lookups compare against the host as
/// serialized by the URL parser, which is lowercased as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    hosts: Arc<[String]>,
}

impl AllowList {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = hosts
            .into_iter()
            .map(|host| host.as_ref().trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect::<Vec<_>>();
        Self {
            hosts: hosts.into(),
        }
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_HOSTS)
    }
}

/// Immutable settings shared by every component.
///
/// Built once at startup and handed to each component behind an `Arc`, so
/// nothing reads ambient globals and tests can swap in a local allow-list.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RelayConfig {
    /// Hosts accepted by the normalizer.
    #[builder(default)]
    pub allow_list: AllowList,
    /// Deadline applied to each metadata probe attempt.
    #[builder(default = DEFAULT_PROBE_TIMEOUT)]
    pub probe_timeout: Duration,
    /// Candidates drawn before a short code is accepted regardless of collision.
    #[builder(default = DEFAULT_MAX_CODE_ATTEMPTS)]
    pub max_code_attempts: usize,
    /// Freshness lifetime advertised for cacheable responses.
    #[builder(default = DEFAULT_CACHE_MAX_AGE)]
    pub cache_max_age: Duration,
    /// Responses with larger bodies are streamed but never stored.
    #[builder(default = DEFAULT_MAX_CACHEABLE_BYTES)]
    pub max_cacheable_bytes: u64,
    /// User-Agent sent on every upstream request.
    #[builder(default = DEFAULT_USER_AGENT.to_string(), setter(into))]
    pub user_agent: String,
    /// Value of the product-identifying response header.
    #[builder(default = DEFAULT_PRODUCT.to_string(), setter(into))]
    pub product: String,
}

impl RelayConfig {
    /// `Cache-Control` value for responses that may be reused indefinitely.
    pub fn immutable_cache_control(&self) -> String {
        format!(
            "public, max-age={}, immutable",
            self.cache_max_age.as_secs()
        )
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allow_list_covers_github_hosts() {
        let allow = AllowList::default();
        for host in DEFAULT_ALLOWED_HOSTS {
            assert!(allow.contains(host));
        }
        assert!(allow.contains("GitHub.com"));
        assert!(!allow.contains("gitlab.com"));
        assert!(!allow.contains("evil.github.com"));
    }

    #[test]
    fn custom_allow_list_ignores_blank_entries() {
        let allow = AllowList::new(["  Example.org ", ""]);
        assert_eq!(allow.hosts().collect::<Vec<_>>(), vec!["example.org"]);
    }

    #[test]
    fn immutable_cache_control_uses_one_year() {
        let config = RelayConfig::default();
        assert_eq!(
            config.immutable_cache_control(),
            "public, max-age=31536000, immutable"
        );
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = RelayConfig::builder()
            .probe_timeout(Duration::from_millis(250))
            .product("test-relay")
            .build();
        assert_eq!(config.probe_timeout, Duration::from_millis(250));
        assert_eq!(config.product, "test-relay");
        assert_eq!(config.max_code_attempts, DEFAULT_MAX_CODE_ATTEMPTS);
    }
}
