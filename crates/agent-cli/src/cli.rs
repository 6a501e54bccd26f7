//! Command-line Flags

use clap::Parser;

use crate::config::ProviderKind;

#[derive(Parser, Debug, Default)]
#[command(name = "react-agent", version)]
#[command(about = "ReAct agent answering one query with local or MCP-hosted tools", long_about = None)]
pub struct Cli {
    /// Query to answer; prompted for when omitted
    #[arg(short, long)]
    pub query: Option<String>,

    /// Model backend
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Model (or Azure deployment) name
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub temperature: Option<f32>,

    /// Reasoning iteration cap, 0 for unbounded
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Tool host command; tools run remotely over MCP stdio when set
    #[arg(long, value_name = "COMMAND")]
    pub mcp_server: Option<String>,

    /// Arguments passed to the tool host command
    #[arg(last = true, value_name = "ARGS")]
    pub server_args: Vec<String>,
}
