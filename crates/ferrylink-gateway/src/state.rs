use std::sync::Arc;

use ferrylink_core::RelayConfig;
use ferrylink_proxy::{MetadataResolver, ProxyEngine};
use ferrylink_shortener::Shortener;
use http::HeaderMap;
use typed_builder::TypedBuilder;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

#[derive(Clone, TypedBuilder)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    engine: Arc<ProxyEngine>,
    resolver: Arc<MetadataResolver>,
    config: Arc<RelayConfig>,
    /// Base for issued short URLs; derived from the request when unset.
    #[builder(default)]
    public_base_url: Option<String>,
}

impl AppState {
    pub fn shortener(&self) -> &dyn Shortener {
        self.shortener.as_ref()
    }

    pub fn engine(&self) -> &ProxyEngine {
        &self.engine
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// `scheme://host` that short URLs are issued under.
    ///
    /// Uses the configured public base URL when present, otherwise the
    /// request's `Host` and `X-Forwarded-Proto` (default `http`).
    pub fn short_url_base(&self, headers: &HeaderMap) -> String {
        if let Some(base) = &self.public_base_url {
            return base.trim_end_matches('/').to_string();
        }

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let scheme = header(FORWARDED_PROTO)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .unwrap_or("http");
        let host = header(http::header::HOST.as_str()).unwrap_or("localhost");
        format!("{scheme}://{host}")
    }
}
