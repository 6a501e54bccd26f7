//! wttr.in Client
//!
//! Uses the `format=j1` JSON report and keeps only the current conditions.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{WeatherClient, WeatherReport};
use crate::error::{Result, ToolboxError};

pub const WTTR_BASE_URL: &str = "https://wttr.in";

#[derive(Debug, Deserialize)]
struct J1Report {
    #[serde(default)]
    current_condition: Vec<J1Current>,
    #[serde(default)]
    nearest_area: Vec<J1Area>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct J1Current {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    humidity: String,
    #[serde(default)]
    weather_desc: Vec<J1Text>,
    windspeed_kmph: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct J1Area {
    #[serde(default)]
    area_name: Vec<J1Text>,
    #[serde(default)]
    country: Vec<J1Text>,
}

#[derive(Debug, Deserialize)]
struct J1Text {
    value: String,
}

fn first_text(items: &[J1Text]) -> Option<&str> {
    items.first().map(|t| t.value.trim()).filter(|v| !v.is_empty())
}

fn into_report(location: &str, report: J1Report) -> Result<WeatherReport> {
    let current = report
        .current_condition
        .into_iter()
        .next()
        .ok_or_else(|| ToolboxError::NoWeatherData(location.to_string()))?;

    let area = report
        .nearest_area
        .first()
        .and_then(|a| {
            let name = first_text(&a.area_name)?;
            Some(match first_text(&a.country) {
                Some(country) => format!("{name}, {country}"),
                None => name.to_string(),
            })
        })
        .unwrap_or_else(|| location.to_string());

    Ok(WeatherReport {
        area,
        description: first_text(&current.weather_desc).unwrap_or("Unknown").to_string(),
        temp_c: current.temp_c,
        feels_like_c: current.feels_like_c,
        humidity: current.humidity,
        wind_kmph: current.windspeed_kmph,
    })
}

pub struct WttrClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for WttrClient {
    fn default() -> Self {
        Self::new(WTTR_BASE_URL)
    }
}

impl WttrClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("react-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn report_url(&self, location: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ToolboxError::Weather(format!("bad base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ToolboxError::Weather("base url cannot carry a path".into()))?
            .pop_if_empty()
            .push(location.trim());
        url.query_pairs_mut().append_pair("format", "j1");
        Ok(url)
    }
}

#[async_trait]
impl WeatherClient for WttrClient {
    async fn current(&self, location: &str) -> Result<WeatherReport> {
        let url = self.report_url(location)?;
        tracing::debug!(%url, "Fetching weather");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ToolboxError::Weather(format!(
                "HTTP {} for {location}",
                response.status()
            )));
        }

        let report: J1Report = response.json().await?;
        into_report(location, report)
    }

    fn name(&self) -> &str {
        "wttr.in"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "current_condition": [{
            "FeelsLikeC": "17",
            "humidity": "60",
            "temp_C": "18",
            "weatherDesc": [{"value": "Partly cloudy"}],
            "windspeedKmph": "11"
        }],
        "nearest_area": [{
            "areaName": [{"value": "Paris"}],
            "country": [{"value": "France"}]
        }],
        "weather": []
    }"#;

    #[test]
    fn test_condenses_j1_report() {
        let report = into_report("paris", serde_json::from_str(SAMPLE).unwrap()).unwrap();
        assert_eq!(
            report.summary(),
            "Weather for Paris, France: Partly cloudy, 18°C (feels like 17°C), humidity 60%, wind 11 km/h"
        );
    }

    #[test]
    fn test_empty_report_is_error() {
        let report: J1Report = serde_json::from_str("{}").unwrap();
        assert!(matches!(into_report("nowhere", report), Err(ToolboxError::NoWeatherData(_))));
    }

    #[test]
    fn test_location_is_path_encoded() {
        let client = WttrClient::default();
        let url = client.report_url(" New York ").unwrap();
        assert_eq!(url.as_str(), "https://wttr.in/New%20York?format=j1");
    }
}
