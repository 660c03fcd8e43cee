use crate::platform::Platform;
use std::env;
use std::time::Duration;

/// Cache backend selection
#[derive(Clone, Debug, PartialEq)]
pub enum CacheStoreType {
    Memory,
    Valkey,
}

impl CacheStoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStoreType::Memory => "memory",
            CacheStoreType::Valkey => "valkey",
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub is_dev: bool,
    /// Cache backend: memory (default) or valkey
    pub cache_store: CacheStoreType,
    /// Valkey/Redis URL (used when cache_store = Valkey)
    pub valkey_url: Option<String>,
    /// Per-attempt timeout for upstream platform calls, in seconds
    pub upstream_timeout_secs: u64,
    /// Haokan API base URL (overridable for tests)
    pub haokan_api_url: String,
    /// AcFun play-info API base URL (overridable for tests)
    pub acfun_api_url: String,
    /// Haokan cache TTL override in seconds; 0 means no expiry
    pub haokan_ttl_secs: Option<u64>,
    /// AcFun cache TTL override in seconds; 0 means no expiry
    pub acfun_ttl_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    /// In DEV mode, provides sensible defaults. In PROD mode, PORT is required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        // Port: required in prod, defaults to 8888 in dev
        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "8888".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let cache_store = match env::var("CACHE_STORE")
            .unwrap_or_else(|_| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "valkey" | "redis" => CacheStoreType::Valkey,
            _ => CacheStoreType::Memory,
        };
        let valkey_url = env::var("VALKEY_URL").ok();

        let upstream_timeout_secs: u64 = env::var("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let haokan_api_url = env::var("HAOKAN_API_URL")
            .unwrap_or_else(|_| "https://sv.baidu.com/appui/api".to_string());
        let acfun_api_url = env::var("ACFUN_API_URL").unwrap_or_else(|_| {
            "https://api-new.acfunchina.com/rest/app/play/playInfo".to_string()
        });

        let haokan_ttl_secs = env::var("HAOKAN_TTL_SECS").ok().and_then(|v| v.parse().ok());
        let acfun_ttl_secs = env::var("ACFUN_TTL_SECS").ok().and_then(|v| v.parse().ok());

        Ok(Config {
            port,
            is_dev,
            cache_store,
            valkey_url,
            upstream_timeout_secs,
            haokan_api_url,
            acfun_api_url,
            haokan_ttl_secs,
            acfun_ttl_secs,
        })
    }

    /// Effective cache TTL for a platform.
    ///
    /// An explicit override of 0 disables expiry; no override falls back to
    /// the platform default.
    pub fn ttl_for(&self, platform: Platform) -> Option<Duration> {
        let secs = match platform {
            Platform::Haokan => self.haokan_ttl_secs,
            Platform::Acfun => self.acfun_ttl_secs,
        };
        match secs {
            Some(0) => None,
            Some(n) => Some(Duration::from_secs(n)),
            None => platform.default_ttl(),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serialize all env-var tests to prevent races between parallel test threads.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Set env vars, run `f`, then restore original state.
    ///
    /// `set` — vars to set; `unset` — vars to remove before running `f`.
    fn with_env(set: &[(&str, &str)], unset: &[&str], f: impl FnOnce()) {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());

        // Save state for all touched vars
        let save_set: Vec<(&str, Option<String>)> = set
            .iter()
            .map(|(k, _)| (*k, std::env::var(k).ok()))
            .collect();
        let save_unset: Vec<(&str, Option<String>)> =
            unset.iter().map(|k| (*k, std::env::var(k).ok())).collect();

        for (k, v) in set {
            // SAFETY: serialized by ENV_LOCK — no other thread modifies env vars concurrently.
            unsafe { std::env::set_var(k, v) };
        }
        for k in unset {
            unsafe { std::env::remove_var(k) };
        }

        f();

        // Restore
        for (k, old) in save_set.into_iter().chain(save_unset) {
            match old {
                Some(v) => unsafe { std::env::set_var(k, v) },
                None => unsafe { std::env::remove_var(k) },
            }
        }
    }

    #[test]
    fn dev_mode_uses_defaults() {
        with_env(
            &[("DEV_MODE", "true")],
            &[
                "PORT",
                "CACHE_STORE",
                "VALKEY_URL",
                "UPSTREAM_TIMEOUT_SECS",
                "HAOKAN_API_URL",
                "ACFUN_API_URL",
                "HAOKAN_TTL_SECS",
                "ACFUN_TTL_SECS",
            ],
            || {
                let config = Config::from_env().expect("should succeed in dev mode");
                assert!(config.is_dev);
                assert_eq!(config.port, 8888);
                assert_eq!(config.cache_store, CacheStoreType::Memory);
                assert_eq!(config.upstream_timeout_secs, 5);
                assert_eq!(config.haokan_api_url, "https://sv.baidu.com/appui/api");
                assert_eq!(config.haokan_ttl_secs, None);
            },
        );
    }

    #[test]
    fn prod_mode_requires_port() {
        with_env(&[], &["DEV_MODE", "PORT"], || {
            let result = Config::from_env();
            assert!(result.is_err(), "Should fail without PORT in prod mode");
        });
    }

    #[test]
    fn cache_store_valkey() {
        with_env(
            &[("DEV_MODE", "true"), ("CACHE_STORE", "valkey")],
            &[],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.cache_store, CacheStoreType::Valkey);
            },
        );
    }

    #[test]
    fn cache_store_redis_alias() {
        with_env(&[("DEV_MODE", "true"), ("CACHE_STORE", "redis")], &[], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.cache_store, CacheStoreType::Valkey);
        });
    }

    #[test]
    fn cache_store_defaults_to_memory() {
        with_env(&[("DEV_MODE", "true")], &["CACHE_STORE"], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.cache_store, CacheStoreType::Memory);
        });
    }

    #[test]
    fn upstream_timeout_parsed() {
        with_env(
            &[("DEV_MODE", "true"), ("UPSTREAM_TIMEOUT_SECS", "10")],
            &[],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.upstream_timeout(), Duration::from_secs(10));
            },
        );
    }

    #[test]
    fn ttl_defaults_follow_platform() {
        with_env(
            &[("DEV_MODE", "true")],
            &["HAOKAN_TTL_SECS", "ACFUN_TTL_SECS"],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.ttl_for(Platform::Haokan), None);
                assert_eq!(
                    config.ttl_for(Platform::Acfun),
                    Some(Duration::from_secs(3600))
                );
            },
        );
    }

    #[test]
    fn ttl_override_applies() {
        with_env(
            &[("DEV_MODE", "true"), ("HAOKAN_TTL_SECS", "900")],
            &[],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(
                    config.ttl_for(Platform::Haokan),
                    Some(Duration::from_secs(900))
                );
            },
        );
    }

    #[test]
    fn ttl_override_zero_disables_expiry() {
        with_env(&[("DEV_MODE", "true"), ("ACFUN_TTL_SECS", "0")], &[], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.ttl_for(Platform::Acfun), None);
        });
    }
}
