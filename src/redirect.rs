//! Redirect URL assembly.
//!
//! Cached values are compact fragments (path + query of the resolved media
//! URL) rather than full URLs: the origin serves identical content from a
//! pool of equivalent edge hosts, so pinning an entry to the host that
//! happened to appear in one upstream response would waste space and tie the
//! entry to a possibly short-lived edge node. Expansion picks a pool host at
//! random, spreading read traffic across edges.

use crate::error::{Result, VidlinkError};
use crate::platform::Platform;
use rand::seq::IndexedRandom;
use url::Url;

/// Extract the cacheable fragment (path + query) from a full media URL.
pub fn compact(media_url: &str) -> Result<String> {
    let parsed = Url::parse(media_url)
        .map_err(|_| VidlinkError::InvalidMediaUrl(media_url.to_string()))?;
    if !parsed.has_host() {
        return Err(VidlinkError::InvalidMediaUrl(media_url.to_string()));
    }
    let mut fragment = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        fragment.push('?');
        fragment.push_str(query);
    }
    Ok(fragment)
}

/// Expand a cached fragment into a servable redirect URL.
///
/// Host selection is uniform random over the platform's fixed pool.
pub fn expand(platform: Platform, fragment: &str) -> String {
    let pool = platform.host_pool();
    // Pools are compile-time non-empty per platform
    let host = pool
        .choose(&mut rand::rng())
        .unwrap_or(&pool[0]);
    format!("https://{}{}", host, fragment)
}
