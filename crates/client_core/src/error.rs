use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid service url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned HTTP {status}{}", api_suffix(.api))]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        api: Option<ApiError>,
    },
    #[error("failed to decode response of {method} {url}: {source}")]
    Decode {
        method: &'static str,
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

fn api_suffix(api: &Option<ApiError>) -> String {
    api.as_ref()
        .map(|api| format!(" ({api})"))
        .unwrap_or_default()
}

impl ClientError {
    /// Backend error body, when the service sent one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Status { api, .. } => api.as_ref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
