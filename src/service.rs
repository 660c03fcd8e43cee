//! Resolve-cache-redirect orchestration.
//!
//! Cache-aside: check the cache, on a miss call the platform resolver once,
//! answer with the fresh URL, and populate the cache off the response path.
//! There is deliberately no cross-request de-duplication — two concurrent
//! first-time requests for the same identifier may both call upstream; both
//! derive the same fragment, so the race is benign.

use crate::cache::CacheStore;
use crate::error::{Result, VidlinkError};
use crate::metrics;
use crate::platform::Platform;
use crate::redirect;
use crate::resolver::UpstreamResolver;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Outcome of a resolve: where to send the caller, and whether the cache
/// served it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub location: String,
    pub cache_used: bool,
}

#[derive(Clone)]
pub struct ResolveService {
    cache: CacheStore,
    resolvers: Arc<HashMap<Platform, Arc<dyn UpstreamResolver>>>,
    ttls: Arc<HashMap<Platform, Option<Duration>>>,
}

impl ResolveService {
    pub fn new(
        cache: CacheStore,
        resolvers: HashMap<Platform, Arc<dyn UpstreamResolver>>,
        ttls: HashMap<Platform, Option<Duration>>,
    ) -> Self {
        Self {
            cache,
            resolvers: Arc::new(resolvers),
            ttls: Arc::new(ttls),
        }
    }

    /// Resolve an identifier to a redirect target.
    ///
    /// Cache hit: expand the stored fragment against the platform host pool,
    /// no upstream call. Cache miss: exactly one upstream call; the fragment
    /// write happens in a spawned task so the first-seen path does not pay
    /// for it.
    pub async fn resolve(&self, platform: Platform, id: &str) -> Result<Resolution> {
        if let Some(fragment) = self.cache.get(platform, id).await {
            metrics::record_cache(platform, true);
            return Ok(Resolution {
                location: redirect::expand(platform, &fragment),
                cache_used: true,
            });
        }
        metrics::record_cache(platform, false);

        let resolver = self
            .resolvers
            .get(&platform)
            .ok_or_else(|| VidlinkError::UnknownPlatform(platform.to_string()))?;

        let media = match resolver.resolve(id).await {
            Ok(media) => media,
            Err(e) => {
                metrics::record_upstream_error(platform);
                return Err(e);
            }
        };

        match redirect::compact(&media.url) {
            Ok(fragment) => {
                // Best-effort, off the response path. A failed write is
                // logged inside the store and never reaches the caller.
                let cache = self.cache.clone();
                let ttl = self.ttls.get(&platform).copied().flatten();
                let id = id.to_string();
                tokio::spawn(async move {
                    cache.set(platform, &id, &fragment, ttl).await;
                });
            }
            Err(e) => {
                warn!("Not caching {} {}: {}", platform, id, e);
            }
        }

        Ok(Resolution {
            location: media.url,
            cache_used: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolvedMedia;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeResolver {
        platform: Platform,
        url: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl UpstreamResolver for FakeResolver {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn resolve(&self, id: &str) -> Result<ResolvedMedia> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if id == "missing" {
                return Err(VidlinkError::NotFound(id.to_string()));
            }
            Ok(ResolvedMedia {
                url: self.url.clone(),
                quality: "hd".to_string(),
            })
        }
    }

    fn service_with(
        cache: CacheStore,
        url: &str,
    ) -> (ResolveService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = FakeResolver {
            platform: Platform::Haokan,
            url: url.to_string(),
            calls: calls.clone(),
        };
        let mut resolvers: HashMap<Platform, Arc<dyn UpstreamResolver>> = HashMap::new();
        resolvers.insert(Platform::Haokan, Arc::new(resolver));
        let mut ttls = HashMap::new();
        ttls.insert(Platform::Haokan, None);
        (ResolveService::new(cache, resolvers, ttls), calls)
    }

    #[tokio::test]
    async fn miss_then_hit_calls_upstream_once() {
        let (service, calls) = service_with(
            CacheStore::new_memory(),
            "https://vd2.bdstatic.com/path/a.m3u8",
        );

        let first = service.resolve(Platform::Haokan, "123456").await.unwrap();
        assert!(!first.cache_used);
        assert_eq!(first.location, "https://vd2.bdstatic.com/path/a.m3u8");

        // Give the spawned cache write a moment to land
        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = service.resolve(Platform::Haokan, "123456").await.unwrap();
        assert!(second.cache_used);
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "cache hit must not call upstream"
        );

        // Expansion may pick a different pool host, but path must match
        assert!(second.location.ends_with("/path/a.m3u8"));
        let host_ok = Platform::Haokan
            .host_pool()
            .iter()
            .any(|h| second.location.starts_with(&format!("https://{}", h)));
        assert!(host_ok, "unexpected host in {}", second.location);
    }

    #[tokio::test]
    async fn cache_write_failure_does_not_fail_the_request() {
        let (service, calls) = service_with(
            CacheStore::new_broken(),
            "https://vd1.bdstatic.com/path/a.m3u8",
        );

        let first = service.resolve(Platform::Haokan, "123456").await.unwrap();
        assert_eq!(first.location, "https://vd1.bdstatic.com/path/a.m3u8");
        assert!(!first.cache_used);

        tokio::time::sleep(Duration::from_millis(20)).await;

        // Every request misses, but all of them succeed
        let second = service.resolve(Platform::Haokan, "123456").await.unwrap();
        assert!(!second.cache_used);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn not_found_propagates_and_caches_nothing() {
        let (service, _calls) = service_with(
            CacheStore::new_memory(),
            "https://vd1.bdstatic.com/path/a.m3u8",
        );

        let err = service
            .resolve(Platform::Haokan, "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, VidlinkError::NotFound(_)));
    }

    #[tokio::test]
    async fn uncacheable_url_still_redirects() {
        // Resolver hands back something the URL parser rejects
        let (service, calls) = service_with(CacheStore::new_memory(), "not a url");

        let first = service.resolve(Platform::Haokan, "7").await.unwrap();
        assert_eq!(first.location, "not a url");

        tokio::time::sleep(Duration::from_millis(20)).await;

        // Nothing was cached, so the next request resolves again
        let second = service.resolve(Platform::Haokan, "7").await.unwrap();
        assert!(!second.cache_used);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn platform_without_resolver_is_unknown() {
        let (service, _calls) = service_with(
            CacheStore::new_memory(),
            "https://vd1.bdstatic.com/path/a.m3u8",
        );

        let err = service.resolve(Platform::Acfun, "1").await.unwrap_err();
        assert!(matches!(err, VidlinkError::UnknownPlatform(_)));
    }
}
