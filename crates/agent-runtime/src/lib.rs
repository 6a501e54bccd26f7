//! # agent-runtime
//!
//! Runtime providers and transports for the react-agent system.
//!
//! ## Providers
//!
//! - **Ollama** (default): Local LLM inference via Ollama
//! - **OpenAI** (default): OpenAI or Azure OpenAI chat completions
//!
//! ## Transports
//!
//! - **MCP stdio**: spawn a tool host and call its tools through
//!   [`agent_core::ToolSession`], or serve a registry as a tool host
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{OllamaProvider, mcp::StdioConnector};
//!
//! let session = Arc::new(ToolSession::new(StdioConnector::parse("tool-host")?));
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(OllamaProvider::localhost()))
//!     .tools(session.clone())
//!     .build()?;
//! ```

pub mod mcp;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

#[cfg(feature = "openai")]
pub use openai::{OpenAiEndpoint, OpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{
    AgentBuilder, AgentError, AgentLoop, LlmProvider, Message, Result, Role, ToolRegistry,
    ToolSession, ToolSource,
};
