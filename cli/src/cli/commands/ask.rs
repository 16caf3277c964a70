use std::path::PathBuf;

use replica_core::config::load_config;
use replica_core::contract::{QueryRequest, QueryResponse, QuotaExceeded};
use replica_core::proxy::UpstreamClient;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};

pub async fn run(
    config_path: Option<PathBuf>,
    query: String,
    user: String,
    session: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let upstream = UpstreamClient::new(config.upstream_origin());

    let session_id = session.unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
    let request = QueryRequest {
        user_id: user,
        session_id,
        query,
        stream: false,
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let resp = upstream
        .forward(
            Method::POST,
            "chat/query",
            headers,
            Some(serde_json::to_vec(&request)?),
        )
        .await?;

    match resp.status() {
        StatusCode::TOO_MANY_REQUESTS => {
            let quota: QuotaExceeded = resp.json().await?;
            anyhow::bail!("quota exceeded: {}", quota.detail);
        }
        status if status.is_success() => {
            let answer: QueryResponse = resp.json().await?;
            println!("{}", answer.response);
            println!();
            println!("  intent: {} (confidence {:.2})", answer.intent, answer.confidence);
            println!("  provider: {} ({} ms)", answer.provider, answer.response_time_ms);
            if let Some(sources) = answer.sources.as_deref() {
                if !sources.is_empty() {
                    println!("  sources: {}", sources.join(", "));
                }
            }
            Ok(())
        }
        status => anyhow::bail!("backend returned {}", status),
    }
}
