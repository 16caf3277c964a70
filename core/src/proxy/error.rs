//! Proxy failure taxonomy and the uniform error envelope
//!
//! Only failures of the proxy itself are represented here. Error responses
//! produced by the backend (4xx/5xx, including the 429 quota case) are not
//! proxy failures and relay unmodified.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// JSON shape surfaced to the caller when the proxy fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// No backend origin configured. Checked before any network call.
    #[error("Missing BACKEND_URL env var")]
    MissingOrigin,

    /// Transport-level failure talking to the backend (connect, DNS,
    /// malformed response, timeout imposed by the transport).
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// A body that claimed to be JSON did not parse, or could not be
    /// re-encoded.
    #[error("invalid JSON {context}: {source}")]
    InvalidJson {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The inbound request body could not be read.
    #[error("failed to read request body: {0}")]
    BodyRead(#[from] axum::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingOrigin => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) | Self::InvalidJson { .. } | Self::BodyRead(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    fn envelope(&self) -> ErrorBody {
        match self {
            Self::MissingOrigin => ErrorBody {
                error: self.to_string(),
                detail: None,
            },
            other => ErrorBody {
                error: "Proxy error".to_string(),
                detail: Some(other.to_string()),
            },
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}
