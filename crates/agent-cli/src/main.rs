//! react-agent
//!
//! Answers one query with the ReAct loop. Tools run in-process unless a tool
//! host is configured, in which case they are reached over MCP stdio.

mod cli;
mod config;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentLoop, ToolSession, ToolSource};
use agent_toolbox::DemoTools;

use crate::cli::Cli;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing; stdout is reserved for the conversation
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("reading configuration")?;
    config.merge_cli(&cli);

    let provider = config
        .build_provider()
        .context("configuring model provider")?;

    match provider.health_check().await {
        Ok(true) => tracing::info!(provider = provider.name(), "✓ Model provider reachable"),
        Ok(false) | Err(_) => {
            tracing::warn!(provider = provider.name(), "⚠ Model provider not available - agent will fail");
        }
    }

    let session = config.tool_host().map(|connector| Arc::new(ToolSession::new(connector)));
    let tools: Arc<dyn ToolSource> = match &session {
        Some(session) => Arc::clone(session) as Arc<dyn ToolSource>,
        None => Arc::new(
            DemoTools::default()
                .registry()
                .context("registering demo tools")?,
        ),
    };

    let agent = AgentLoop::new(provider, tools, config.agent_config());

    let query = match cli.query {
        Some(query) => query,
        None => read_query().context("reading query from stdin")?,
    };

    match agent.run(&query).await {
        Ok(answer) => println!("Final Answer: {answer}"),
        Err(e) => eprintln!("Error running agent: {}", e.user_message()),
    }

    if let Some(session) = session {
        session.close().await;
    }

    Ok(())
}

fn read_query() -> std::io::Result<String> {
    print!("Enter your query: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
