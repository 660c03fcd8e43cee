//! Baidu Haokan resolver.
//!
//! Calls the undocumented `video/relate` app API and extracts the media URL
//! from the current video's quality list. The API answers 200 with a JSON
//! envelope even for missing videos; absence shows up as a missing
//! `cur_video` path, not as an HTTP error.

use super::{ResolvedMedia, UpstreamResolver, select_quality, upstream_unavailable};
use crate::error::{Result, VidlinkError};
use crate::platform::Platform;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Quality tiers in descending preference order.
const QUALITY_TIERS: [&str; 4] = ["1080p", "sc", "hd", "sd"];

/// Response envelope for `cmd=video/relate`. Every level is optional: the
/// API serves the same envelope shape for unknown vids, minus `cur_video`.
#[derive(Debug, Deserialize)]
struct RelateEnvelope {
    #[serde(rename = "video/relate")]
    relate: Option<RelateBody>,
}

#[derive(Debug, Deserialize)]
struct RelateBody {
    data: Option<RelateData>,
}

#[derive(Debug, Deserialize)]
struct RelateData {
    cur_video: Option<CurVideo>,
}

#[derive(Debug, Deserialize)]
struct CurVideo {
    /// Quality tier → media URL
    video_list: Option<HashMap<String, String>>,
}

pub struct HaokanResolver {
    client: Client,
    api_url: String,
}

impl HaokanResolver {
    pub fn new(client: Client, api_url: String) -> Self {
        Self { client, api_url }
    }
}

#[async_trait]
impl UpstreamResolver for HaokanResolver {
    fn platform(&self) -> Platform {
        Platform::Haokan
    }

    async fn resolve(&self, id: &str) -> Result<ResolvedMedia> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("cmd", "video/relate"), ("vid", id)])
            .header(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.8,*/*;q=0.8",
            )
            .header("cache-control", "no-cache")
            .header("connection", "keep-alive")
            .header("user-agent", super::USER_AGENT)
            .send()
            .await
            .map_err(|e| upstream_unavailable("haokan api request", e))?;

        if response.status().is_server_error() {
            return Err(VidlinkError::UpstreamUnavailable(format!(
                "haokan api returned {}",
                response.status()
            )));
        }

        let body: RelateEnvelope = response
            .json()
            .await
            .map_err(|e| VidlinkError::UpstreamFormatError(format!("haokan api body: {}", e)))?;

        // The envelope is present even for unknown vids; a missing video_list
        // means the platform has no such video.
        let video_list = body
            .relate
            .and_then(|r| r.data)
            .and_then(|d| d.cur_video)
            .and_then(|c| c.video_list)
            .ok_or_else(|| VidlinkError::NotFound(id.to_string()))?;

        let media = select_quality(&QUALITY_TIERS, |tier| video_list.get(tier).cloned())
            .ok_or_else(|| {
                VidlinkError::UpstreamFormatError(format!(
                    "haokan video_list for {} has no known quality tier",
                    id
                ))
            })?;

        debug!("Resolved haokan vid {} at quality {}", id, media.quality);
        Ok(media)
    }
}
