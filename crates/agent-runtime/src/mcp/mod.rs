//! Model Context Protocol over stdio
//!
//! Newline-delimited JSON-RPC 2.0 between an agent ([`McpTransport`], usually
//! created by [`StdioConnector`]) and a tool host ([`McpServer`]).

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{McpTransport, StdioConnector};
pub use server::McpServer;
