use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

use crate::{
    config::ForecastDays,
    error::ProviderError,
    model::{DailyForecast, LocationRef, RawConditions, RawForecast},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct AccuWeatherProvider {
    api_key: String,
    base_url: String,
    forecast_days: ForecastDays,
    http: Client,
}

impl AccuWeatherProvider {
    pub fn new(api_key: String, base_url: String, forecast_days: ForecastDays) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("route-weather/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for AccuWeather")?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            forecast_days,
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "AccuWeather request");

        let res = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(query)
            .timeout(timeout)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            debug!(%url, %status, body = %truncate_body(&body), "AccuWeather request failed");
            return Err(ProviderError::HttpStatus(status.as_u16()));
        }

        serde_json::from_str(&body)
            .map_err(|err| ProviderError::Malformed(format!("{err}: {}", truncate_body(&body))))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwLocation {
    key: String,
    #[serde(default)]
    localized_name: String,
    geo_position: AwGeoPosition,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwGeoPosition {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwValue {
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwMetricSpeed {
    metric: Option<AwValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwCurrentWind {
    speed: Option<AwMetricSpeed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwCurrentConditions {
    #[serde(default)]
    has_precipitation: bool,
    precipitation_type: Option<String>,
    relative_humidity: Option<f64>,
    wind: Option<AwCurrentWind>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwTemperature {
    maximum: Option<AwValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwDayWind {
    speed: Option<AwValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwDayPart {
    rain_probability: Option<f64>,
    wind: Option<AwDayWind>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwDailyForecast {
    date: DateTime<FixedOffset>,
    temperature: Option<AwTemperature>,
    day: Option<AwDayPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwForecastResponse {
    daily_forecasts: Vec<AwDailyForecast>,
}

impl From<AwLocation> for LocationRef {
    fn from(loc: AwLocation) -> Self {
        Self {
            id: loc.key,
            name: loc.localized_name,
            latitude: loc.geo_position.latitude,
            longitude: loc.geo_position.longitude,
        }
    }
}

impl From<AwCurrentConditions> for RawConditions {
    fn from(current: AwCurrentConditions) -> Self {
        let wind_speed_kmh = current
            .wind
            .and_then(|w| w.speed)
            .and_then(|s| s.metric)
            .and_then(|m| m.value);

        Self {
            has_precipitation: current.has_precipitation,
            precipitation_type: current.precipitation_type,
            relative_humidity: current.relative_humidity,
            wind_speed_kmh,
        }
    }
}

impl From<AwDailyForecast> for DailyForecast {
    fn from(day: AwDailyForecast) -> Self {
        let (rain_probability_pct, wind_speed_kmh) = match day.day {
            Some(part) => (part.rain_probability, part.wind.and_then(|w| w.speed).and_then(|s| s.value)),
            None => (None, None),
        };

        Self {
            // Local calendar date of the location, not UTC.
            date: day.date.date_naive(),
            max_temperature_c: day.temperature.and_then(|t| t.maximum).and_then(|m| m.value),
            rain_probability_pct,
            wind_speed_kmh,
        }
    }
}

#[async_trait]
impl WeatherProvider for AccuWeatherProvider {
    async fn search_places(
        &self,
        query: &str,
        timeout: Duration,
    ) -> Result<Vec<LocationRef>, ProviderError> {
        let found: Vec<AwLocation> =
            self.get_json("/locations/v1/cities/search", &[("q", query)], timeout).await?;

        Ok(found.into_iter().map(LocationRef::from).collect())
    }

    async fn current_conditions(
        &self,
        location_id: &str,
        timeout: Duration,
    ) -> Result<RawConditions, ProviderError> {
        let path = format!("/currentconditions/v1/{location_id}");
        let observations: Vec<AwCurrentConditions> =
            self.get_json(&path, &[("details", "true")], timeout).await?;

        observations
            .into_iter()
            .next()
            .map(RawConditions::from)
            .ok_or_else(|| ProviderError::Malformed("no current conditions returned".to_string()))
    }

    async fn daily_forecast(
        &self,
        location_id: &str,
        timeout: Duration,
    ) -> Result<RawForecast, ProviderError> {
        let path = format!("/forecasts/v1/daily/{}day/{location_id}", self.forecast_days.count());
        let parsed: AwForecastResponse = self
            .get_json(&path, &[("metric", "true"), ("details", "true")], timeout)
            .await?;

        if parsed.daily_forecasts.is_empty() {
            return Err(ProviderError::Malformed("forecast contained no days".to_string()));
        }

        Ok(RawForecast { days: parsed.daily_forecasts.into_iter().map(DailyForecast::from).collect() })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
