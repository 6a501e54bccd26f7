//! Weather Service Integration
//!
//! Abstraction over current-conditions lookups, with a wttr.in client and a
//! fixed in-memory client for tests and offline demos.

mod fixed;
mod wttr;

pub use fixed::FixedWeatherClient;
pub use wttr::{WTTR_BASE_URL, WttrClient};

use async_trait::async_trait;

use crate::error::Result;

/// Current conditions at one location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeatherReport {
    /// Resolved place name, e.g. "Paris, France"
    pub area: String,
    pub description: String,
    pub temp_c: String,
    pub feels_like_c: String,
    pub humidity: String,
    pub wind_kmph: String,
}

impl WeatherReport {
    pub fn summary(&self) -> String {
        format!(
            "Weather for {}: {}, {}°C (feels like {}°C), humidity {}%, wind {} km/h",
            self.area, self.description, self.temp_c, self.feels_like_c, self.humidity, self.wind_kmph
        )
    }
}

/// Weather client trait (Strategy pattern)
#[async_trait]
pub trait WeatherClient: Send + Sync {
    async fn current(&self, location: &str) -> Result<WeatherReport>;

    fn name(&self) -> &str;
}
