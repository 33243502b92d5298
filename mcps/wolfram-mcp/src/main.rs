//! Wolfram|Alpha MCP Server
//!
//! Serves the Wolfram|Alpha tools over stdio.
//!
//! # Configuration
//! Set `WOLFRAM_APPID` and `WOLFRAM_SIG_SALT`, or configure in `~/.wolfram/wolfram.toml`

use rmcp::{transport::stdio, ServiceExt};
use wolfram_core::{Config, WolframClient};
use wolfram_mcp::WolframMcpServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wolfram_core::init_tracing("wolfram_mcp")?;

    tracing::info!("Starting Wolfram|Alpha MCP Server");

    let config = Config::load()?;
    tracing::info!("Provider host: {}", config.provider.host);

    let client = WolframClient::from_config(&config)?;
    let server = WolframMcpServer::new(client);
    let service = server.serve(stdio()).await?;

    tracing::info!("Server running, waiting for requests...");
    service.waiting().await?;

    tracing::info!("Server shutting down");
    Ok(())
}
