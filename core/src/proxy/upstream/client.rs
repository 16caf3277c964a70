//! Upstream client for the configured chat backend

use reqwest::{header::HeaderMap, Client, Method, Response};

use crate::proxy::error::ProxyError;

/// Every forwarded path lives under this prefix on the backend.
const API_PREFIX: &str = "/api/";

#[derive(Clone)]
pub struct UpstreamClient {
    http_client: Client,
    origin: Option<String>,
}

impl UpstreamClient {
    /// `origin` is the backend base URL (scheme + host, no path), injected
    /// once at construction. `None` starts the client in unconfigured mode:
    /// every call fails with a configuration error, never a network attempt.
    ///
    /// The client sets no request timeout and never retries. Both are left
    /// to the transport and the caller.
    pub fn new(origin: Option<String>) -> Self {
        let http_client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self { http_client, origin }
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Target URL for a forwarded path: `<origin>/api/<path>` with exactly
    /// one slash at each joint. An empty `path` targets the backend's
    /// `/api/` root.
    pub fn build_url(&self, path: &str) -> Result<String, ProxyError> {
        let origin = self.origin().ok_or(ProxyError::MissingOrigin)?;
        Ok(join_url(origin, path))
    }

    /// Single-attempt dispatch of an already-filtered request.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response, ProxyError> {
        let url = self.build_url(path)?;
        tracing::debug!("Forwarding {} {}", method, url);

        let mut request = self.http_client.request(method, &url).headers(headers);
        if let Some(bytes) = body {
            request = request.body(bytes);
        }

        Ok(request.send().await?)
    }
}

/// A single trailing slash on the origin is tolerated and normalized away,
/// so the result never contains `//api`.
pub(crate) fn join_url(origin: &str, path: &str) -> String {
    let base = origin.strip_suffix('/').unwrap_or(origin);
    format!("{}{}{}", base, API_PREFIX, path)
}
