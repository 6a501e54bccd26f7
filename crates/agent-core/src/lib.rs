//! # agent-core
//!
//! ReAct agent loop with a provider-agnostic LLM abstraction and pluggable
//! tool dispatch, local or remote.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         AgentLoop                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────┐  │
//! │  │PromptComposer│  │  ToolSource  │  │    LlmProvider     │  │
//! │  │ + HistoryLog │──│ (Registry or │──│    (Strategy)      │  │
//! │  │ + parse_step │  │  ToolSession)│  │                    │  │
//! │  └──────────────┘  └──────────────┘  └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait lets the loop run against Ollama, OpenAI, Azure
//! OpenAI or a scripted test double without changing agent logic. The
//! `ToolSource` trait does the same for in-process tools and tools served by
//! a separate host process.

pub mod catalog;
pub mod error;
pub mod history;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod source;
pub mod step;
pub mod tool;

pub use catalog::{CatalogEntry, ToolCatalog};
pub use error::{AgentError, Result};
pub use history::{HistoryLog, Observation};
pub use message::{Message, Role};
pub use prompt::{PromptComposer, REACT_PROMPT_TEMPLATE, TOOL_PLACEHOLDER};
pub use provider::{Completion, GenerationOptions, LlmProvider};
pub use reasoning::{AgentBuilder, AgentConfig, AgentLoop, RunTrace};
pub use session::{CallToolResult, ContentItem, RemoteTool, ToolSession, ToolTransport, TransportConnector};
pub use source::ToolSource;
pub use step::{ActionRequest, ReasoningStep, StepOutcome, parse_step};
pub use tool::{BundleMember, FnTool, Tool, ToolBundle, ToolItem, ToolRegistry};
