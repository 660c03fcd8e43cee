//! Partitioned fragment cache.
//!
//! Each platform maps to an isolated keyspace so identical identifiers on
//! different platforms can never collide. The store is strictly best-effort:
//! a failed read degrades to a miss and a failed write is logged and
//! swallowed — cache trouble must never fail a request whose redirect has
//! already been computed.

use crate::platform::Platform;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[cfg(feature = "valkey")]
use redis::aio::ConnectionManager;
#[cfg(feature = "valkey")]
use std::collections::HashMap;
#[cfg(feature = "valkey")]
use tracing::info;

/// A cached fragment with optional expiry, memory backend only.
#[derive(Clone, Debug)]
struct MemoryEntry {
    fragment: String,
    expires_at: Option<Instant>,
}

/// Internal storage backend
#[derive(Clone)]
enum Backend {
    Memory {
        entries: Arc<DashMap<String, MemoryEntry>>,
    },
    #[cfg(feature = "valkey")]
    Valkey {
        /// One connection per platform, each pinned to its logical db.
        conns: HashMap<Platform, ConnectionManager>,
    },
    /// Backend that fails every operation, for write-failure isolation tests.
    #[cfg(test)]
    Broken,
}

/// Fragment cache — same public API regardless of backend
#[derive(Clone)]
pub struct CacheStore {
    backend: Backend,
}

impl CacheStore {
    /// Create an in-memory cache (default)
    pub fn new_memory() -> Self {
        Self {
            backend: Backend::Memory {
                entries: Arc::new(DashMap::new()),
            },
        }
    }

    /// Create a Valkey-backed cache with one connection per platform db.
    #[cfg(feature = "valkey")]
    pub async fn new_valkey(url: &str) -> Result<Self, redis::RedisError> {
        let mut conns = HashMap::new();
        for platform in Platform::ALL {
            let client = redis::Client::open(Self::db_url(url, platform.redis_db()))?;
            let conn = ConnectionManager::new(client).await?;
            conns.insert(platform, conn);
        }
        info!("Connected to Valkey at {}", url);
        Ok(Self {
            backend: Backend::Valkey { conns },
        })
    }

    #[cfg(test)]
    pub(crate) fn new_broken() -> Self {
        Self {
            backend: Backend::Broken,
        }
    }

    /// Rewrite a Valkey URL to target a specific logical db.
    ///
    /// Any db path already present on the configured URL is replaced, not
    /// appended to.
    #[cfg(feature = "valkey")]
    fn db_url(url: &str, db: u8) -> String {
        let base = match url.find("://").map(|i| i + 3) {
            Some(start) => url[start..]
                .find('/')
                .map(|slash| &url[..start + slash])
                .unwrap_or(url),
            None => url,
        };
        format!("{}/{}", base.trim_end_matches('/'), db)
    }

    fn key(platform: Platform, id: &str) -> String {
        format!("{}{}", platform.key_prefix(), id)
    }

    /// Look up a cached fragment. Backend errors degrade to a miss.
    pub async fn get(&self, platform: Platform, id: &str) -> Option<String> {
        let key = Self::key(platform, id);
        match &self.backend {
            Backend::Memory { entries } => {
                if let Some(entry) = entries.get(&key) {
                    let expired = entry
                        .expires_at
                        .map(|at| Instant::now() >= at)
                        .unwrap_or(false);
                    if !expired {
                        debug!("Cache HIT for {}", key);
                        return Some(entry.fragment.clone());
                    }
                    // Stale — drop the read guard before removing
                    drop(entry);
                    entries.remove(&key);
                }
                debug!("Cache MISS for {}", key);
                None
            }
            #[cfg(feature = "valkey")]
            Backend::Valkey { conns } => {
                let mut conn = conns.get(&platform)?.clone();
                match redis::cmd("GET")
                    .arg(&key)
                    .query_async::<Option<String>>(&mut conn)
                    .await
                {
                    Ok(value) => value,
                    Err(e) => {
                        // Fail open: an unreachable cache is a miss, not an error
                        tracing::warn!("Valkey GET failed for {}: {}", key, e);
                        None
                    }
                }
            }
            #[cfg(test)]
            Backend::Broken => {
                tracing::warn!("Cache GET failed for {}: backend unavailable", key);
                None
            }
        }
    }

    /// Store a fragment with optional expiry. Errors are logged and swallowed.
    pub async fn set(&self, platform: Platform, id: &str, fragment: &str, ttl: Option<Duration>) {
        let key = Self::key(platform, id);
        match &self.backend {
            Backend::Memory { entries } => {
                entries.insert(
                    key,
                    MemoryEntry {
                        fragment: fragment.to_string(),
                        expires_at: ttl.map(|ttl| Instant::now() + ttl),
                    },
                );
            }
            #[cfg(feature = "valkey")]
            Backend::Valkey { conns } => {
                let Some(conn) = conns.get(&platform) else {
                    return;
                };
                let mut conn = conn.clone();
                let mut cmd = redis::cmd("SET");
                cmd.arg(&key).arg(fragment);
                if let Some(ttl) = ttl {
                    cmd.arg("EX").arg(ttl.as_secs().max(1));
                }
                if let Err(e) = cmd.query_async::<()>(&mut conn).await {
                    tracing::warn!("Valkey SET failed for {}: {}", key, e);
                }
            }
            #[cfg(test)]
            Backend::Broken => {
                tracing::warn!("Cache SET failed for {}: backend unavailable", key);
            }
        }
    }
}
