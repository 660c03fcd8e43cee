use crate::error::VidlinkError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Supported video platforms.
///
/// A platform is the unit of partitioning for the whole pipeline: it selects
/// the upstream resolver, the cache keyspace, and the CDN host pool used to
/// expand cached fragments back into redirect URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Baidu Haokan video
    Haokan,
    /// AcFun bangumi
    Acfun,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Haokan, Platform::Acfun];

    /// Cache key prefix, also the inbound path segment.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Platform::Haokan => "haokan",
            Platform::Acfun => "acfun",
        }
    }

    /// Logical Redis database holding this platform's entries.
    ///
    /// Keeps keyspaces structurally separate so operators can flush or
    /// apply retention policy per platform.
    pub fn redis_db(&self) -> u8 {
        match self {
            Platform::Haokan => 3,
            Platform::Acfun => 1,
        }
    }

    /// Pool of equivalent CDN edge hosts for redirect expansion.
    ///
    /// Precondition (external, unverifiable here): every host in a pool
    /// serves identical content for the same path+query fragment.
    pub fn host_pool(&self) -> &'static [&'static str] {
        match self {
            Platform::Haokan => &[
                "vd1.bdstatic.com",
                "vd2.bdstatic.com",
                "vd3.bdstatic.com",
                "vd4.bdstatic.com",
            ],
            Platform::Acfun => &["ali-safety-video.acfun.cn", "tx-safety-video.acfun.cn"],
        }
    }

    /// Default cache TTL for this platform's entries.
    ///
    /// Haokan CDN paths have proven stable, so its entries never expire
    /// unless configured otherwise; AcFun play URLs carry signed tokens
    /// with a short lifetime.
    pub fn default_ttl(&self) -> Option<Duration> {
        match self {
            Platform::Haokan => None,
            Platform::Acfun => Some(Duration::from_secs(3600)),
        }
    }
}

impl FromStr for Platform {
    type Err = VidlinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "haokan" => Ok(Platform::Haokan),
            "acfun" => Ok(Platform::Acfun),
            other => Err(VidlinkError::UnknownPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}
