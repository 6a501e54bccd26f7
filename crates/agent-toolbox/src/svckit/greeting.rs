//! Greeting Tool

use async_trait::async_trait;

use agent_core::{Result as CoreResult, Tool};

pub const NAME: &str = "greeting";

pub struct GreetingTool;

#[async_trait]
impl Tool for GreetingTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Returns a greeting message for the given name."
    }

    async fn invoke(&self, argument: &str) -> CoreResult<String> {
        Ok(format!(
            "Hello, {}! This is a simple MCP server response.",
            argument.trim()
        ))
    }
}
