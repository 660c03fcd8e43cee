use crate::error::Result;
use crate::metrics;
use crate::platform::Platform;
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

static X_CACHE_USED: HeaderName = HeaderName::from_static("x-cache-used");

/// Resolve a platform video identifier and answer with a 307 redirect to
/// the playable media URL.
pub async fn resolve_video(
    Path((platform, id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Response> {
    let platform: Platform = platform.parse()?;

    info!("Resolving {} video {}", platform, id);

    match state.service.resolve(platform, &id).await {
        Ok(resolution) => {
            metrics::record_request("resolve", StatusCode::TEMPORARY_REDIRECT.as_u16());
            Ok((
                StatusCode::TEMPORARY_REDIRECT,
                [
                    (header::LOCATION, resolution.location.as_str()),
                    (header::CONTENT_TYPE, "video/mp4"),
                    (header::CACHE_CONTROL, "no-cache"),
                    (header::REFERRER_POLICY, "no-referrer"),
                    (
                        X_CACHE_USED.clone(),
                        if resolution.cache_used { "Yes" } else { "No" },
                    ),
                ],
            )
                .into_response())
        }
        Err(e) => {
            metrics::record_request("resolve", e.status().as_u16());
            Err(e)
        }
    }
}
