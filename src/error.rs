use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Caller-visible failures of the resolve pipeline.
///
/// `UpstreamUnavailable` is the only retryable kind and maps to 504 so
/// clients can tell it apart from schema drift (502) and definitive
/// absence (404).
#[derive(Debug, Error)]
pub enum VidlinkError {
    /// The platform confirmed the video does not exist.
    #[error("video not found: {0}")]
    NotFound(String),

    /// Network failure, timeout, or upstream 5xx.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream answered but its response shape was unexpected.
    #[error("unexpected upstream response: {0}")]
    UpstreamFormatError(String),

    /// The inbound path named a platform we do not resolve.
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    /// The resolved media URL could not be split into a cacheable fragment.
    #[error("invalid media url: {0}")]
    InvalidMediaUrl(String),
}

pub type Result<T> = std::result::Result<T, VidlinkError>;

impl VidlinkError {
    pub fn status(&self) -> StatusCode {
        match self {
            VidlinkError::NotFound(_) | VidlinkError::UnknownPlatform(_) => StatusCode::NOT_FOUND,
            VidlinkError::UpstreamUnavailable(_) => StatusCode::GATEWAY_TIMEOUT,
            VidlinkError::UpstreamFormatError(_) | VidlinkError::InvalidMediaUrl(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for VidlinkError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            VidlinkError::NotFound("123".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            VidlinkError::UnknownPlatform("vimeo".to_string()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unavailable_is_distinguishable_from_format_error() {
        let unavailable = VidlinkError::UpstreamUnavailable("timeout".to_string());
        let format = VidlinkError::UpstreamFormatError("missing field".to_string());
        assert_ne!(unavailable.status(), format.status());
        assert_eq!(unavailable.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(format.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn messages_are_human_readable() {
        let err = VidlinkError::NotFound("123456".to_string());
        assert_eq!(err.to_string(), "video not found: 123456");
    }
}
