use clap::{Parser, ValueEnum};
use ferrylink_cache::moka::DEFAULT_CAPACITY_BYTES;
use ferrylink_core::config::{DEFAULT_MAX_CACHEABLE_BYTES, DEFAULT_PROBE_TIMEOUT};
use ferrylink_core::{AllowList, RelayConfig};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "FERRYLINK_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "FERRYLINK_PUBLIC_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "FERRYLINK_STORAGE_BACKEND";
pub const REDIS_URL_ENV: &str = "FERRYLINK_REDIS_URL";
pub const ALLOWED_HOSTS_ENV: &str = "FERRYLINK_ALLOWED_HOSTS";
pub const PROBE_TIMEOUT_MS_ENV: &str = "FERRYLINK_PROBE_TIMEOUT_MS";
pub const CACHE_CAPACITY_BYTES_ENV: &str = "FERRYLINK_CACHE_CAPACITY_BYTES";
pub const MAX_CACHEABLE_BYTES_ENV: &str = "FERRYLINK_MAX_CACHEABLE_BYTES";
pub const LOG_JSON_ENV: &str = "FERRYLINK_LOG_JSON";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "ferrylink-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Base for issued short URLs; derived from each request when unset.
    #[arg(long, env = PUBLIC_BASE_URL_ENV)]
    pub public_base_url: Option<String>,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("storage", "redis"))]
    pub redis_url: Option<String>,

    /// Replaces the built-in host allow-list.
    #[arg(long = "allowed-host", env = ALLOWED_HOSTS_ENV, value_delimiter = ',')]
    pub allowed_hosts: Vec<String>,

    #[arg(long, env = PROBE_TIMEOUT_MS_ENV, default_value_t = DEFAULT_PROBE_TIMEOUT.as_millis() as u64)]
    pub probe_timeout_ms: u64,

    #[arg(long, env = CACHE_CAPACITY_BYTES_ENV, default_value_t = DEFAULT_CAPACITY_BYTES)]
    pub cache_capacity_bytes: u64,

    #[arg(long, env = MAX_CACHEABLE_BYTES_ENV, default_value_t = DEFAULT_MAX_CACHEABLE_BYTES)]
    pub max_cacheable_bytes: u64,

    #[arg(long, env = LOG_JSON_ENV)]
    pub log_json: bool,
}

impl CLI {
    pub fn relay_config(&self) -> RelayConfig {
        let allow_list = if self.allowed_hosts.is_empty() {
            AllowList::default()
        } else {
            AllowList::new(&self.allowed_hosts)
        };

        RelayConfig::builder()
            .allow_list(allow_list)
            .probe_timeout(Duration::from_millis(self.probe_timeout_ms))
            .max_cacheable_bytes(self.max_cacheable_bytes)
            .build()
    }
}
