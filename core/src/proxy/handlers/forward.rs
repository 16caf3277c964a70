//! Wildcard forwarding handler
//!
//! Relays anything under `/api/` to `<origin>/api/<path>` on the configured
//! backend: same method, filtered headers, re-encoded body. The backend's
//! status and body come back verbatim; only proxy-side failures produce the
//! 500/502 error envelope.

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Request, State},
    http::{
        header::{HeaderMap, HeaderValue, CONTENT_TYPE},
        Method,
    },
    response::Response,
};
use bytes::Bytes;
use serde_json::Value;

use crate::proxy::error::ProxyError;
use crate::proxy::server::AppState;

/// Request headers never forwarded: connection-scoped, or describing wire
/// bytes this proxy rebuilds itself.
const SKIP_REQUEST_HEADERS: [&str; 4] = ["host", "content-length", "connection", "accept-encoding"];

/// Response headers never relayed. The body is re-framed (and possibly
/// re-serialized) before it leaves the proxy, so the upstream's encoding and
/// length no longer describe it.
const SKIP_RESPONSE_HEADERS: [&str; 3] = ["content-encoding", "transfer-encoding", "content-length"];

/// Methods that never carry a forwarded body, whatever the inbound request had.
const BODYLESS_METHODS: [Method; 2] = [Method::GET, Method::HEAD];

/// Closed classification of the content types the relay treats specially.
/// Anything unrecognized is opaque bytes, passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    Json,
    Opaque,
}

impl ContentCategory {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if content_type.contains("application/json") {
            Self::Json
        } else {
            Self::Opaque
        }
    }
}

/// `any /api/*path`
pub async fn forward(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, ProxyError> {
    match relay(&state, &path, request).await {
        Ok(response) => Ok(response),
        Err(err) => {
            tracing::warn!("Forward to /api/{} failed: {}", path, err);
            Err(err)
        }
    }
}

/// `any /api` - forwards to the backend's `/api/` root.
pub async fn forward_root(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ProxyError> {
    match relay(&state, "", request).await {
        Ok(response) => Ok(response),
        Err(err) => {
            tracing::warn!("Forward to /api/ failed: {}", err);
            Err(err)
        }
    }
}

async fn relay(state: &AppState, path: &str, request: Request) -> Result<Response, ProxyError> {
    let method = request.method().clone();
    let category = ContentCategory::from_headers(request.headers());
    let outbound_headers = filter_request_headers(request.headers());

    let body = if BODYLESS_METHODS.contains(&method) {
        None
    } else {
        let bytes = to_bytes(request.into_body(), usize::MAX).await?;
        encode_body(&bytes, category)?
    };

    let upstream = state
        .upstream
        .forward(method, path, outbound_headers, body)
        .await?;

    let status = upstream.status();
    let relayed_headers = filter_response_headers(upstream.headers());
    let response_category = ContentCategory::from_headers(upstream.headers());
    let bytes = upstream.bytes().await?;

    tracing::debug!("Upstream answered {} for /api/{}", status, path);

    let body = match response_category {
        // Re-emit through the serializer so the relayed bytes always match
        // the now-decoded, re-framed body.
        ContentCategory::Json => {
            let value: Value = serde_json::from_slice(&bytes).map_err(|source| {
                ProxyError::InvalidJson {
                    context: "in upstream response",
                    source,
                }
            })?;
            Bytes::from(serde_json::to_vec(&value).map_err(|source| ProxyError::InvalidJson {
                context: "re-encoding upstream response",
                source,
            })?)
        }
        ContentCategory::Opaque => bytes,
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = relayed_headers;
    Ok(response)
}

/// Copy inbound headers minus the skip set. Multi-valued headers collapse to
/// a single comma-joined value; keys are already lower-cased by the HTTP
/// layer. Values that are not valid visible-ASCII are dropped.
fn filter_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();

    for name in headers.keys() {
        if SKIP_REQUEST_HEADERS.contains(&name.as_str()) {
            continue;
        }

        let joined = headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");

        if let Ok(value) = HeaderValue::from_str(&joined) {
            filtered.insert(name.clone(), value);
        }
    }

    filtered
}

/// Copy upstream headers minus the skip set, preserving repeated names
/// (set-cookie).
fn filter_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();

    for (name, value) in headers {
        if SKIP_RESPONSE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }

    filtered
}

/// Body for the outbound request. JSON bodies are parsed and re-serialized
/// so the forwarded bytes are a canonical encoding of what the caller sent;
/// everything else forwards verbatim. Empty bodies forward as no body.
fn encode_body(bytes: &Bytes, category: ContentCategory) -> Result<Option<Vec<u8>>, ProxyError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    match category {
        ContentCategory::Json => {
            let value: Value =
                serde_json::from_slice(bytes).map_err(|source| ProxyError::InvalidJson {
                    context: "in request body",
                    source,
                })?;
            let encoded =
                serde_json::to_vec(&value).map_err(|source| ProxyError::InvalidJson {
                    context: "re-encoding request body",
                    source,
                })?;
            Ok(Some(encoded))
        }
        ContentCategory::Opaque => Ok(Some(bytes.to_vec())),
    }
}
