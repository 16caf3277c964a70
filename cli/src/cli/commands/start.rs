use std::path::PathBuf;

use replica_core::config::{load_config, BACKEND_URL_ENV};
use replica_core::proxy::ProxyServer;

pub async fn run(config_path: Option<PathBuf>, port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    let mut config = load_config(config_path)?;

    // Apply port override if provided
    if let Some(port) = port_override {
        config.server.port = port;
    }

    let origin = config.upstream_origin();

    tracing::info!("Starting Replica Proxy...");
    tracing::info!("  Host: {}", config.server.host);
    tracing::info!("  Port: {}", config.server.port);
    match &origin {
        Some(origin) => tracing::info!("  Backend origin: {}", origin),
        None => {
            tracing::warn!(
                "No backend origin configured. Set {} or [upstream].origin in the config file.",
                BACKEND_URL_ENV
            );
            tracing::warn!("The proxy will start but forwarded requests will fail until it is set.");
        }
    }

    // Create and start server
    let server = ProxyServer::new(config.server.host.clone(), config.server.port, origin);

    tracing::info!(
        "Proxy server starting on http://{}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!("Press Ctrl+C to stop");

    // Run server (blocks until shutdown)
    server.run().await?;

    Ok(())
}
