//! Weather Lookup Tool

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{AgentError, Result as CoreResult, Tool};

use crate::weather::WeatherClient;

pub const NAME: &str = "get_weather";

pub struct WeatherTool {
    client: Arc<dyn WeatherClient>,
}

impl WeatherTool {
    pub fn new(client: Arc<dyn WeatherClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Fetches the current weather for the specified location (a city name, e.g. \"Paris\")."
    }

    async fn invoke(&self, argument: &str) -> CoreResult<String> {
        let location = argument.trim().trim_matches('"');
        if location.is_empty() {
            return Err(AgentError::ToolExecution("a location is required".into()));
        }

        tracing::debug!(client = self.client.name(), location, "Looking up weather");
        let report = self.client.current(location).await?;
        Ok(report.summary())
    }
}
