mod cli;

use crate::cli::{StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use ferrylink_cache::{MokaCacheConfig, MokaResponseCache};
use ferrylink_core::{KvStore, RelayConfig};
use ferrylink_gateway::{App, AppState};
use ferrylink_proxy::{build_client, MetadataResolver, ProxyEngine};
use ferrylink_shortener::{RandomGenerator, ShortLinkRegistry, Shortener};
use ferrylink_storage::{InMemoryKvStore, RedisKvStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CLI::parse();
    init_tracing(cli.log_json);

    let config = Arc::new(cli.relay_config());
    info!(
        listen_addr = %cli.listen_addr,
        storage_backend = %cli.storage,
        allowed_hosts = ?config.allow_list.hosts().collect::<Vec<_>>(),
        "starting ferrylink gateway"
    );

    let shortener = match cli.storage {
        StorageBackendArg::InMemory => registry(InMemoryKvStore::new(), &config),
        StorageBackendArg::Redis => {
            let redis_url = cli
                .redis_url
                .as_deref()
                .context("redis url is required when storage backend is redis")?;
            registry(RedisKvStore::connect(redis_url).await?, &config)
        }
    };

    let client = build_client(&config).context("failed to build upstream HTTP client")?;
    let cache = MokaResponseCache::with_config(
        MokaCacheConfig::builder()
            .max_capacity_bytes(cli.cache_capacity_bytes)
            .ttl(config.cache_max_age)
            .build(),
    );
    let engine = ProxyEngine::new(client.clone(), Arc::new(cache), config.clone());
    let resolver = MetadataResolver::new(client, config.clone());

    let state = AppState::builder()
        .shortener(shortener)
        .engine(Arc::new(engine))
        .resolver(Arc::new(resolver))
        .config(config)
        .public_base_url(cli.public_base_url)
        .build();

    let listener = tokio::net::TcpListener::bind(cli.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}

fn registry<K: KvStore>(kv: K, config: &Arc<RelayConfig>) -> Arc<dyn Shortener> {
    Arc::new(ShortLinkRegistry::new(
        kv,
        RandomGenerator::new(),
        config.clone(),
    ))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}
