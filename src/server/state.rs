use crate::cache::CacheStore;
use crate::config::{CacheStoreType, Config};
use crate::platform::Platform;
use crate::resolver::{AcfunResolver, HaokanResolver, UpstreamResolver};
use crate::service::ResolveService;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state shared across all handlers.
///
/// Owns the long-lived resources: the pooled upstream HTTP client and the
/// cache connections. Built once at startup, released on shutdown when the
/// server drops it.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Resolve-cache-redirect orchestrator
    pub service: ResolveService,
    /// Process start, for health reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub async fn new(config: Config) -> Self {
        let http_client = Client::builder()
            .timeout(config.upstream_timeout())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to create HTTP client");

        let cache = match config.cache_store {
            CacheStoreType::Memory => CacheStore::new_memory(),
            #[cfg(feature = "valkey")]
            CacheStoreType::Valkey => {
                let url = config
                    .valkey_url
                    .clone()
                    .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());
                match CacheStore::new_valkey(&url).await {
                    Ok(cache) => cache,
                    Err(e) => {
                        // Cache is best-effort; a dead backend at startup
                        // degrades to memory instead of refusing to serve.
                        tracing::error!("Valkey unavailable ({}), using memory cache", e);
                        CacheStore::new_memory()
                    }
                }
            }
            #[cfg(not(feature = "valkey"))]
            CacheStoreType::Valkey => {
                tracing::warn!("Built without the valkey feature, using memory cache");
                CacheStore::new_memory()
            }
        };

        let mut resolvers: HashMap<Platform, Arc<dyn UpstreamResolver>> = HashMap::new();
        resolvers.insert(
            Platform::Haokan,
            Arc::new(HaokanResolver::new(
                http_client.clone(),
                config.haokan_api_url.clone(),
            )),
        );
        resolvers.insert(
            Platform::Acfun,
            Arc::new(AcfunResolver::new(
                http_client.clone(),
                config.acfun_api_url.clone(),
            )),
        );

        let ttls = Platform::ALL
            .iter()
            .map(|&p| (p, config.ttl_for(p)))
            .collect();

        let service = ResolveService::new(cache, resolvers, ttls);

        Self {
            config: Arc::new(config),
            service,
            started_at: Instant::now(),
        }
    }
}
