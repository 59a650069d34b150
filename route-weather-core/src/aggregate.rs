//! Route-level orchestration: resolve, fetch, normalize and classify every
//! place independently, then project the outcomes for the two route views.

use std::pin::pin;
use std::time::Duration;

use futures::FutureExt;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{
    Config,
    config::Limits,
    error::PlaceError,
    fetcher::{FetchPolicy, fetch_weather},
    model::{ForecastSeries, GeoPoint, ParameterKind, ParameterPoint, PlaceQuery, WeatherRecord},
    normalize::normalize,
    provider::{WeatherProvider, provider_from_config},
    resolver::resolve_place,
};

/// Stand-in for deadlines too far out to represent.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// One outcome per input place, in input order.
pub type RouteResult = Vec<Result<WeatherRecord, PlaceError>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteReport {
    /// `None` when the requested parameter was not recognised.
    pub parameter: Option<ParameterKind>,
    pub results: RouteResult,
    pub geo_series: Vec<GeoPoint>,
    pub parameter_series: Vec<ParameterPoint>,
    pub forecast_series: Vec<ForecastSeries>,
}

impl RouteReport {
    pub fn records(&self) -> impl Iterator<Item = &WeatherRecord> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    pub fn errors(&self) -> impl Iterator<Item = &PlaceError> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }
}

#[derive(Debug)]
pub struct RouteAggregator {
    provider: Box<dyn WeatherProvider>,
    policy: FetchPolicy,
    worker_limit: usize,
}

impl RouteAggregator {
    pub fn new(provider: Box<dyn WeatherProvider>, limits: &Limits) -> Self {
        Self {
            provider,
            policy: FetchPolicy::from(limits),
            worker_limit: limits.worker_limit(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(provider_from_config(config)?, &config.limits))
    }

    /// Builds the weather report for an ordered route.
    ///
    /// Repeated names are looked up again each time. Places still in flight
    /// when `deadline` expires are reported as unavailable; finished places
    /// are kept.
    pub async fn aggregate(
        &self,
        places: &[String],
        parameter: &str,
        min_temperature_c: Option<f64>,
        deadline: Duration,
    ) -> RouteReport {
        let parameter = match parameter.parse::<ParameterKind>() {
            Ok(parameter) => parameter,
            Err(reason) => {
                warn!(%reason, "Rejecting route");
                let results = places
                    .iter()
                    .map(|place| Err(PlaceError::partial(place.trim(), reason.clone())))
                    .collect();
                return RouteReport {
                    parameter: None,
                    results,
                    geo_series: Vec::new(),
                    parameter_series: Vec::new(),
                    forecast_series: Vec::new(),
                };
            }
        };

        let results = self.run_places(places, deadline).await;

        let report = RouteReport {
            parameter: Some(parameter),
            geo_series: geo_series(&results, parameter),
            parameter_series: parameter_series(&results, parameter, min_temperature_c),
            forecast_series: forecast_series(&results, parameter, min_temperature_c),
            results,
        };

        info!(
            places = places.len(),
            succeeded = report.records().count(),
            failed = report.errors().count(),
            %parameter,
            "Route aggregated"
        );

        report
    }

    async fn run_places(&self, places: &[String], deadline: Duration) -> RouteResult {
        let now = Instant::now();
        let expires_at = now.checked_add(deadline).unwrap_or(now + FAR_FUTURE);
        let mut slots: Vec<Option<Result<WeatherRecord, PlaceError>>> = vec![None; places.len()];

        let mut pending = pin!(
            stream::iter(places.iter().enumerate())
                .map(|(index, raw)| {
                    self.run_place(raw)
                        .map(move |outcome| (index, outcome))
                        .instrument(info_span!("place", index, name = %raw.trim()))
                })
                .buffer_unordered(self.worker_limit)
        );

        loop {
            match tokio::time::timeout_at(expires_at, pending.next()).await {
                Ok(Some((index, outcome))) => slots[index] = Some(outcome),
                Ok(None) => break,
                Err(_) => {
                    let unfinished = slots.iter().filter(|slot| slot.is_none()).count();
                    warn!(unfinished, ?deadline, "Route deadline expired");
                    break;
                }
            }
        }

        slots
            .into_iter()
            .zip(places)
            .map(|(slot, raw)| slot.unwrap_or_else(|| Err(PlaceError::unavailable(raw.trim()))))
            .collect()
    }

    async fn run_place(&self, raw: &str) -> Result<WeatherRecord, PlaceError> {
        let Some(query) = PlaceQuery::parse(raw) else {
            debug!("Blank place name");
            return Err(PlaceError::not_found(raw.trim()));
        };

        let place = resolve_place(self.provider.as_ref(), &query, self.policy.timeout).await?;
        let fetched = fetch_weather(self.provider.as_ref(), &place, self.policy).await?;

        let record =
            normalize(&place, fetched.conditions.as_ref(), fetched.forecast.as_ref())
                .ok_or_else(|| PlaceError::unavailable(place.name.as_str()))?;

        if !record.missing_fields.is_empty() {
            debug!(missing = ?record.missing_fields, "Record built with fallbacks");
        }
        debug!(classification = ?record.classification, "Place done");

        Ok(record)
    }
}

fn passes_threshold(record: &WeatherRecord, min_temperature_c: Option<f64>) -> bool {
    match min_temperature_c {
        None => true,
        Some(min) => record.temperature_c.is_some_and(|t| t >= min),
    }
}

fn successful(results: &[Result<WeatherRecord, PlaceError>]) -> impl Iterator<Item = &WeatherRecord> {
    results.iter().filter_map(|r| r.as_ref().ok())
}

/// Path through every resolved place, in route order.
pub fn geo_series(
    results: &[Result<WeatherRecord, PlaceError>],
    parameter: ParameterKind,
) -> Vec<GeoPoint> {
    successful(results)
        .map(|record| GeoPoint {
            latitude: record.latitude,
            longitude: record.longitude,
            display_value: record.display_value(parameter),
            label: record.label(),
        })
        .collect()
}

/// Selected parameter per place. Places below `min_temperature_c`, or with no
/// known temperature when a minimum is given, are left out.
pub fn parameter_series(
    results: &[Result<WeatherRecord, PlaceError>],
    parameter: ParameterKind,
    min_temperature_c: Option<f64>,
) -> Vec<ParameterPoint> {
    successful(results)
        .filter(|record| passes_threshold(record, min_temperature_c))
        .map(|record| ParameterPoint {
            place: record.place.clone(),
            display_value: record.display_value(parameter),
        })
        .collect()
}

/// Day-by-day values of the selected parameter, one series per place.
pub fn forecast_series(
    results: &[Result<WeatherRecord, PlaceError>],
    parameter: ParameterKind,
    min_temperature_c: Option<f64>,
) -> Vec<ForecastSeries> {
    successful(results)
        .filter(|record| passes_threshold(record, min_temperature_c))
        .map(|record| ForecastSeries {
            place: record.place.clone(),
            points: record
                .outlook
                .iter()
                .filter_map(|day| day.value(parameter).map(|value| (day.date, value)))
                .collect(),
        })
        .collect()
}
