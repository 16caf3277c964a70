//! Wire types for the chat backend API
//!
//! The proxy itself relays bodies opaquely; these models exist for the CLI
//! probe commands and tests that speak the backend's documented surface
//! (`/api/chat/health`, `/api/chat/greeting`, `/api/chat/query`).

use serde::{Deserialize, Serialize};

/// `GET /api/chat/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub providers: Providers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Providers {
    pub chat: ProviderGroup,
    pub embeddings: ProviderGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderGroup {
    pub active: String,
    pub available: Vec<String>,
}

/// `GET /api/chat/greeting`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetingResponse {
    pub message: String,
    pub provider: String,
}

/// `POST /api/chat/query` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub user_id: String,
    pub session_id: String,
    pub query: String,
    #[serde(default)]
    pub stream: bool,
}

/// `POST /api/chat/query` success body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    pub intent: String,
    pub confidence: f64,
    pub response_time_ms: u64,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

/// Body of the backend's 429 when a usage quota is exhausted. The proxy
/// relays it untouched; only the CLI interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaExceeded {
    pub detail: String,
}
