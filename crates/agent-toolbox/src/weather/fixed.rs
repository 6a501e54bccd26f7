//! Fixed Weather Client
//!
//! For testing and offline demos. Returns the same static conditions for a
//! handful of known cities.

use async_trait::async_trait;

use super::{WeatherClient, WeatherReport};
use crate::error::{Result, ToolboxError};

#[derive(Default)]
pub struct FixedWeatherClient;

impl FixedWeatherClient {
    fn conditions(location: &str) -> Option<(&'static str, &'static str, &'static str, &'static str)> {
        // (area, description, temp_c, humidity)
        match location.trim().to_lowercase().as_str() {
            "paris" => Some(("Paris, France", "Partly cloudy", "18", "60")),
            "london" => Some(("London, United Kingdom", "Light rain", "12", "82")),
            "tokyo" => Some(("Tokyo, Japan", "Clear", "24", "55")),
            "new york" => Some(("New York, United States of America", "Sunny", "21", "48")),
            _ => None,
        }
    }
}

#[async_trait]
impl WeatherClient for FixedWeatherClient {
    async fn current(&self, location: &str) -> Result<WeatherReport> {
        let (area, description, temp_c, humidity) = Self::conditions(location)
            .ok_or_else(|| ToolboxError::NoWeatherData(location.to_string()))?;

        Ok(WeatherReport {
            area: area.into(),
            description: description.into(),
            temp_c: temp_c.into(),
            feels_like_c: temp_c.into(),
            humidity: humidity.into(),
            wind_kmph: "10".into(),
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
