//! In-memory provider used by the pipeline's unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::ProviderError;
use crate::model::{DailyForecast, LocationRef, RawConditions, RawForecast};
use crate::provider::WeatherProvider;

type Script<T> = HashMap<String, VecDeque<Result<T, ProviderError>>>;

/// Replays scripted responses per place name or location id.
///
/// Each call pops the next scripted response; the last one repeats. Unknown
/// places resolve to no matches, unknown ids answer 404.
#[derive(Debug, Default)]
pub(crate) struct ScriptedProvider {
    places: HashMap<String, Result<Vec<LocationRef>, ProviderError>>,
    conditions: Mutex<Script<RawConditions>>,
    forecasts: Mutex<Script<RawForecast>>,
    conditions_delay: HashMap<String, Duration>,
    forecast_delay: HashMap<String, Duration>,
    calls: Mutex<HashMap<(&'static str, String), usize>>,
}

impl ScriptedProvider {
    pub fn with_places(
        mut self,
        name: &str,
        result: Result<Vec<LocationRef>, ProviderError>,
    ) -> Self {
        self.places.insert(name.to_string(), result);
        self
    }

    /// Registers a place whose lookup yields a single location `id`.
    pub fn with_place(self, name: &str, id: &str) -> Self {
        self.with_places(name, Ok(vec![location(id, 50.0, 10.0)]))
    }

    pub fn with_conditions(self, id: &str, result: Result<RawConditions, ProviderError>) -> Self {
        self.conditions.lock().unwrap().entry(id.to_string()).or_default().push_back(result);
        self
    }

    pub fn with_forecast(self, id: &str, result: Result<RawForecast, ProviderError>) -> Self {
        self.forecasts.lock().unwrap().entry(id.to_string()).or_default().push_back(result);
        self
    }

    pub fn with_conditions_delay(mut self, id: &str, delay: Duration) -> Self {
        self.conditions_delay.insert(id.to_string(), delay);
        self
    }

    /// Delays both data calls for `id`.
    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.conditions_delay.insert(id.to_string(), delay);
        self.forecast_delay.insert(id.to_string(), delay);
        self
    }

    pub fn calls(&self, kind: &'static str, key: &str) -> usize {
        self.calls.lock().unwrap().get(&(kind, key.to_string())).copied().unwrap_or(0)
    }

    fn record(&self, kind: &'static str, key: &str) {
        *self.calls.lock().unwrap().entry((kind, key.to_string())).or_default() += 1;
    }

    fn next<T: Clone>(script: &Mutex<Script<T>>, id: &str) -> Result<T, ProviderError> {
        let mut script = script.lock().unwrap();
        match script.get_mut(id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Err(ProviderError::HttpStatus(404)),
        }
    }
}

#[async_trait]
impl WeatherProvider for ScriptedProvider {
    async fn search_places(
        &self,
        query: &str,
        _timeout: Duration,
    ) -> Result<Vec<LocationRef>, ProviderError> {
        self.record("places", query);
        self.places.get(query).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn current_conditions(
        &self,
        location_id: &str,
        _timeout: Duration,
    ) -> Result<RawConditions, ProviderError> {
        self.record("conditions", location_id);
        if let Some(delay) = self.conditions_delay.get(location_id) {
            tokio::time::sleep(*delay).await;
        }
        Self::next(&self.conditions, location_id)
    }

    async fn daily_forecast(
        &self,
        location_id: &str,
        _timeout: Duration,
    ) -> Result<RawForecast, ProviderError> {
        self.record("forecast", location_id);
        if let Some(delay) = self.forecast_delay.get(location_id) {
            tokio::time::sleep(*delay).await;
        }
        Self::next(&self.forecasts, location_id)
    }
}

pub(crate) fn location(id: &str, latitude: f64, longitude: f64) -> LocationRef {
    LocationRef { id: id.to_string(), name: format!("loc-{id}"), latitude, longitude }
}

pub(crate) fn conditions(humidity: f64, wind_kmh: f64) -> RawConditions {
    RawConditions {
        has_precipitation: false,
        precipitation_type: None,
        relative_humidity: Some(humidity),
        wind_speed_kmh: Some(wind_kmh),
    }
}

/// Two-day forecast; only the first day drives the record.
pub(crate) fn forecast(max_temperature_c: f64, rain_pct: f64) -> RawForecast {
    let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    RawForecast {
        days: vec![
            DailyForecast {
                date,
                max_temperature_c: Some(max_temperature_c),
                rain_probability_pct: Some(rain_pct),
                wind_speed_kmh: Some(8.0),
            },
            DailyForecast {
                date: date.succ_opt().unwrap(),
                max_temperature_c: Some(max_temperature_c - 2.0),
                rain_probability_pct: Some(rain_pct / 2.0),
                wind_speed_kmh: Some(12.0),
            },
        ],
    }
}
