//! Demo Tool Bundle

use std::sync::Arc;

use agent_core::{BundleMember, Result, ToolBundle, ToolRegistry};

use crate::svckit::{BasicCalculatorTool, GreetingTool, WeatherTool};
use crate::weather::{WeatherClient, WttrClient};

/// Calculator, weather lookup and greeting, registered together
pub struct DemoTools {
    weather: Arc<dyn WeatherClient>,
}

impl Default for DemoTools {
    fn default() -> Self {
        Self::new(Arc::new(WttrClient::default()))
    }
}

impl DemoTools {
    pub fn new(weather: Arc<dyn WeatherClient>) -> Self {
        Self { weather }
    }

    /// A registry holding just this bundle
    pub fn registry(self) -> Result<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(agent_core::ToolItem::bundle(self))?;
        Ok(registry)
    }
}

impl ToolBundle for DemoTools {
    fn bundle_name(&self) -> &str {
        "DemoTools"
    }

    fn members(&self) -> Vec<BundleMember> {
        vec![
            BundleMember::callable(BasicCalculatorTool),
            BundleMember::callable(WeatherTool::new(Arc::clone(&self.weather))),
            BundleMember::callable(GreetingTool),
            BundleMember::Field("weather_service".into()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::FixedWeatherClient;

    #[test]
    fn test_registers_callables_only() {
        let registry = DemoTools::new(Arc::new(FixedWeatherClient)).registry().unwrap();
        assert_eq!(registry.names(), ["basic_calculator", "get_weather", "greeting"]);
    }

    #[tokio::test]
    async fn test_dispatch_through_registry() {
        let registry = DemoTools::new(Arc::new(FixedWeatherClient)).registry().unwrap();

        let text = registry
            .dispatch("basic_calculator", r#"{"num1": 6, "num2": 7, "operation": "multiply"}"#)
            .await;
        assert_eq!(text, "\n\nThe answer is: 42.\nCalculated with basic_calculator.");

        let text = registry.dispatch("get_weather", "Atlantis").await;
        assert_eq!(text, "Tool runtime error: No weather data for Atlantis");
    }
}
