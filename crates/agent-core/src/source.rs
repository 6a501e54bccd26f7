//! Tool Source Capability
//!
//! The agent loop only sees tools through [`ToolSource`]; whether they run
//! in-process ([`ToolRegistry`]) or behind a remote host
//! ([`ToolSession`](crate::session::ToolSession)) is invisible to it.

use async_trait::async_trait;

use crate::catalog::ToolCatalog;
use crate::error::Result;
use crate::tool::ToolRegistry;

#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Catalog of available tools. Failure here is fatal to a run.
    async fn list(&self) -> Result<ToolCatalog>;

    /// Invoke a tool. Never fails: errors come back as observation text.
    async fn invoke(&self, name: &str, argument: &str) -> String;
}

#[async_trait]
impl ToolSource for ToolRegistry {
    async fn list(&self) -> Result<ToolCatalog> {
        Ok(self.catalog())
    }

    async fn invoke(&self, name: &str, argument: &str) -> String {
        self.dispatch(name, argument).await
    }
}
