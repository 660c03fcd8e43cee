//! AcFun bangumi resolver.
//!
//! Calls the app play-info API and picks the best stream from the ranked
//! quality list. Unlike Haokan, AcFun reports missing videos with an
//! explicit non-zero result code.

use super::{ResolvedMedia, UpstreamResolver, select_quality, upstream_unavailable};
use crate::error::{Result, VidlinkError};
use crate::platform::Platform;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Quality tiers in descending preference order.
const QUALITY_TIERS: [&str; 4] = ["1080p", "720p", "540p", "360p"];

/// Play-info response envelope. `result == 0` means success; anything else
/// means the video does not exist (or is region-locked, which the API does
/// not distinguish).
#[derive(Debug, Deserialize)]
struct PlayInfoEnvelope {
    result: i64,
    #[serde(rename = "playInfo")]
    play_info: Option<PlayInfo>,
}

#[derive(Debug, Deserialize)]
struct PlayInfo {
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Debug, Deserialize)]
struct StreamInfo {
    #[serde(rename = "qualityType", default)]
    quality_type: String,
    #[serde(rename = "playUrls", default)]
    play_urls: Vec<String>,
}

pub struct AcfunResolver {
    client: Client,
    api_url: String,
}

impl AcfunResolver {
    pub fn new(client: Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// First play URL for a given quality tier, if that stream is present.
    fn url_for_tier(streams: &[StreamInfo], tier: &str) -> Option<String> {
        streams
            .iter()
            .find(|s| s.quality_type == tier)
            .and_then(|s| s.play_urls.first().cloned())
    }
}

#[async_trait]
impl UpstreamResolver for AcfunResolver {
    fn platform(&self) -> Platform {
        Platform::Acfun
    }

    async fn resolve(&self, id: &str) -> Result<ResolvedMedia> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("videoId", id)])
            .header("user-agent", super::USER_AGENT)
            .header("connection", "keep-alive")
            .send()
            .await
            .map_err(|e| upstream_unavailable("acfun api request", e))?;

        if response.status().is_server_error() {
            return Err(VidlinkError::UpstreamUnavailable(format!(
                "acfun api returned {}",
                response.status()
            )));
        }

        let body: PlayInfoEnvelope = response
            .json()
            .await
            .map_err(|e| VidlinkError::UpstreamFormatError(format!("acfun api body: {}", e)))?;

        if body.result != 0 {
            return Err(VidlinkError::NotFound(id.to_string()));
        }

        let streams = body.play_info.and_then(|p| p.streams).ok_or_else(|| {
            VidlinkError::UpstreamFormatError(format!("acfun playInfo.streams missing for {}", id))
        })?;

        let media = select_quality(&QUALITY_TIERS, |tier| Self::url_for_tier(&streams, tier))
            .ok_or_else(|| {
                VidlinkError::UpstreamFormatError(format!(
                    "acfun streams for {} have no known quality tier",
                    id
                ))
            })?;

        debug!("Resolved acfun video {} at quality {}", id, media.quality);
        Ok(media)
    }
}
