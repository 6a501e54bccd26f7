//! react-agent Tool Host
//!
//! Serves the demo tools over MCP stdio. Stdout is the protocol channel, so
//! all logging goes to stderr.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_runtime::mcp::McpServer;
use agent_toolbox::DemoTools;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .init();

    let tools = DemoTools::default()
        .registry()
        .context("registering demo tools")?;

    let server = McpServer::new("react-agent-tool-host", env!("CARGO_PKG_VERSION"), tools);

    tracing::info!("Registered {} tools:", server.registry().len());
    for name in server.registry().names() {
        tracing::info!("  • {}", name);
    }

    server.serve_stdio().await.context("serving MCP over stdio")?;

    Ok(())
}
