use std::path::PathBuf;

use replica_core::config::{default_config_path, load_config};
use replica_core::contract::HealthResponse;
use replica_core::proxy::UpstreamClient;
use reqwest::header::HeaderMap;
use reqwest::Method;

pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let origin = config.upstream_origin();

    println!("Replica Proxy Status");
    println!("====================");
    println!();
    println!("Configuration:");
    println!("  Config file: {:?}", default_config_path());
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);
    match &origin {
        Some(origin) => println!("  Backend origin: {}", origin),
        None => println!("  Backend origin: (not set)"),
    }
    println!();

    // Check if the proxy itself is reachable
    let url = format!("http://{}:{}/healthz", config.server.host, config.server.port);
    match reqwest::get(&url).await {
        Ok(resp) if resp.status().is_success() => {
            println!("Proxy: RUNNING ✓");
        }
        _ => {
            println!("Proxy: NOT RUNNING");
        }
    }

    // Probe the backend with the same client the server forwards with
    let upstream = UpstreamClient::new(origin);
    if upstream.origin().is_none() {
        println!("Backend: NOT CONFIGURED");
        return Ok(());
    }

    match upstream
        .forward(Method::GET, "chat/health", HeaderMap::new(), None)
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            let health: HealthResponse = resp.json().await?;
            println!("Backend: {} ✓", health.status);
            println!(
                "  Chat provider: {} (available: {})",
                health.providers.chat.active,
                health.providers.chat.available.join(", ")
            );
            println!(
                "  Embeddings provider: {} (available: {})",
                health.providers.embeddings.active,
                health.providers.embeddings.available.join(", ")
            );
        }
        Ok(resp) => {
            println!("Backend: HTTP {}", resp.status());
        }
        Err(e) => {
            println!("Backend: UNREACHABLE ({})", e);
        }
    }

    Ok(())
}
