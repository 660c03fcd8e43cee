pub mod acfun;
pub mod haokan;

use crate::error::{Result, VidlinkError};
use crate::platform::Platform;
use async_trait::async_trait;

pub use acfun::AcfunResolver;
pub use haokan::HaokanResolver;

/// Browser user-agent sent on upstream calls; the platform APIs reject
/// obvious non-browser clients.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/107.0.0.0 Safari/537.36";

/// A freshly resolved media URL and the quality tier it represents.
///
/// Transient: only the path+query fragment derived from `url` is ever
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMedia {
    /// Fully qualified media URL as returned by the platform
    pub url: String,
    /// Quality tier the URL was selected from (e.g. "hd", "1080p")
    pub quality: String,
}

/// Trait for per-platform upstream resolvers
///
/// Implementations issue exactly one outbound call to the platform API and
/// extract the best-quality media URL. They never touch the cache — caching
/// is the orchestrator's concern.
#[async_trait]
pub trait UpstreamResolver: Send + Sync {
    /// Platform this resolver serves
    fn platform(&self) -> Platform;

    /// Resolve a video identifier into a playable media URL.
    ///
    /// # Errors
    /// - [`VidlinkError::NotFound`] when the platform reports the video absent
    /// - [`VidlinkError::UpstreamUnavailable`] on network failure, timeout, or 5xx
    /// - [`VidlinkError::UpstreamFormatError`] when the response shape is unexpected
    async fn resolve(&self, id: &str) -> Result<ResolvedMedia>;
}

/// Pick the first available quality tier in descending preference order.
///
/// Iteration must stop at the first match: walking the whole list and
/// keeping the last hit would silently invert the preference order.
pub fn select_quality<F>(ranked: &[&str], lookup: F) -> Option<ResolvedMedia>
where
    F: Fn(&str) -> Option<String>,
{
    for tier in ranked {
        if let Some(url) = lookup(tier) {
            return Some(ResolvedMedia {
                url,
                quality: tier.to_string(),
            });
        }
    }
    None
}

/// Map a transport-level failure to the caller-visible taxonomy.
pub(crate) fn upstream_unavailable(context: &str, e: reqwest::Error) -> VidlinkError {
    VidlinkError::UpstreamUnavailable(format!("{}: {}", context, e))
}
