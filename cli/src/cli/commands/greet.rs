use std::path::PathBuf;

use replica_core::config::load_config;
use replica_core::contract::GreetingResponse;
use replica_core::proxy::UpstreamClient;
use reqwest::header::HeaderMap;
use reqwest::Method;

pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let upstream = UpstreamClient::new(config.upstream_origin());

    let resp = upstream
        .forward(Method::GET, "chat/greeting", HeaderMap::new(), None)
        .await?;

    if !resp.status().is_success() {
        anyhow::bail!("backend returned {}", resp.status());
    }

    let greeting: GreetingResponse = resp.json().await?;
    println!("{}", greeting.message);
    println!();
    println!("  provider: {}", greeting.provider);

    Ok(())
}
