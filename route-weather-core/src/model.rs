use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::classify::Classification;
use crate::error::{PartialReason, PlaceError};

/// A place name as typed by the caller, trimmed and known to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceQuery(String);

impl PlaceQuery {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One candidate returned by a place lookup, in provider relevance order.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRef {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPlace {
    /// The name the caller asked for, not the provider's spelling.
    pub name: String,
    pub location_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Observed conditions, as far as the pipeline consumes them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawConditions {
    pub has_precipitation: bool,
    pub precipitation_type: Option<String>,
    pub relative_humidity: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
}

impl RawConditions {
    /// Rain is falling right now.
    pub fn is_raining(&self) -> bool {
        self.has_precipitation
            && self
                .precipitation_type
                .as_deref()
                .is_some_and(|kind| kind.eq_ignore_ascii_case("rain"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub max_temperature_c: Option<f64>,
    pub rain_probability_pct: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
}

/// Daily forecast; the first day is "today".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawForecast {
    pub days: Vec<DailyForecast>,
}

impl RawForecast {
    pub fn today(&self) -> Option<&DailyForecast> {
        self.days.first()
    }
}

/// Selectable display parameter. Also names the record fields that can go missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Temperature,
    WindSpeed,
    Humidity,
    RainProbability,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::Temperature => "temperature",
            ParameterKind::WindSpeed => "wind_speed",
            ParameterKind::Humidity => "humidity",
            ParameterKind::RainProbability => "rain_probability",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ParameterKind::Temperature => "°C",
            ParameterKind::WindSpeed => "km/h",
            ParameterKind::Humidity | ParameterKind::RainProbability => "%",
        }
    }

    pub const fn all() -> &'static [ParameterKind] {
        &[
            ParameterKind::Temperature,
            ParameterKind::WindSpeed,
            ParameterKind::Humidity,
            ParameterKind::RainProbability,
        ]
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKind {
    type Err = PartialReason;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "temperature" => Ok(ParameterKind::Temperature),
            "windspeed" => Ok(ParameterKind::WindSpeed),
            "humidity" => Ok(ParameterKind::Humidity),
            "rainprobability" => Ok(ParameterKind::RainProbability),
            _ => Err(PartialReason::UnknownParameter(value.to_string())),
        }
    }
}

/// One day of the multi-day outlook carried on a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyOutlook {
    pub date: NaiveDate,
    pub max_temperature_c: Option<f64>,
    pub rain_probability_pct: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
}

impl From<&DailyForecast> for DailyOutlook {
    fn from(day: &DailyForecast) -> Self {
        Self {
            date: day.date,
            max_temperature_c: day.max_temperature_c,
            rain_probability_pct: day.rain_probability_pct,
            wind_speed_kmh: day.wind_speed_kmh,
        }
    }
}

impl DailyOutlook {
    /// Rain and wind default to `0` so every place has the same days.
    /// Humidity has no daily source.
    pub fn value(&self, parameter: ParameterKind) -> Option<f64> {
        match parameter {
            ParameterKind::Temperature => self.max_temperature_c,
            ParameterKind::RainProbability => Some(self.rain_probability_pct.unwrap_or(0.0)),
            ParameterKind::WindSpeed => Some(self.wind_speed_kmh.unwrap_or(0.0)),
            ParameterKind::Humidity => None,
        }
    }
}

/// Canonical per-place result.
///
/// Numeric fields are `None` when unknown; every such field is listed in
/// `missing_fields`. Wind speed and rain probability display as `0` when
/// missing, which is why the set exists at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRecord {
    pub place: String,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature_c: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub rain_probability_pct: Option<f64>,
    pub classification: Classification,
    pub missing_fields: BTreeSet<ParameterKind>,
    pub outlook: Vec<DailyOutlook>,
}

impl WeatherRecord {
    /// Value shown for `parameter`, with the display default applied.
    pub fn display_value(&self, parameter: ParameterKind) -> Option<f64> {
        match parameter {
            ParameterKind::Temperature => self.temperature_c,
            ParameterKind::WindSpeed => Some(self.wind_speed_kmh.unwrap_or(0.0)),
            ParameterKind::Humidity => self.humidity_pct,
            ParameterKind::RainProbability => Some(self.rain_probability_pct.unwrap_or(0.0)),
        }
    }

    pub fn is_missing(&self, field: ParameterKind) -> bool {
        self.missing_fields.contains(&field)
    }

    /// Rejects records that had to fall back on any field.
    pub fn require_complete(&self) -> Result<&Self, PlaceError> {
        if self.missing_fields.is_empty() {
            Ok(self)
        } else {
            Err(PlaceError::partial(
                self.place.clone(),
                PartialReason::MissingFields(self.missing_fields.clone()),
            ))
        }
    }

    /// Short text used to annotate a point on the route.
    pub fn label(&self) -> String {
        let temperature = self
            .temperature_c
            .map(|t| format!("{t:.1}°C"))
            .unwrap_or_else(|| "n/a".to_string());
        let rain = self.rain_probability_pct.unwrap_or(0.0);
        format!("{}: {temperature}, rain {rain:.0}%", self.place)
    }
}

/// Route point for the geo view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub display_value: Option<f64>,
    pub label: String,
}

/// Bar/line point for the parameter-by-place view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterPoint {
    pub place: String,
    /// `None` when the record has no value for the selected parameter.
    pub display_value: Option<f64>,
}

/// Day-by-day values of the selected parameter for one place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSeries {
    pub place: String,
    pub points: Vec<(NaiveDate, f64)>,
}
