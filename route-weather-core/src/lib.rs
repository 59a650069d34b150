//! Core library for the `route-weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The upstream weather provider abstraction and its AccuWeather client
//! - The per-place pipeline: resolve, fetch, normalize, classify
//! - Route aggregation and the geo / parameter projections
//!
//! It is used by `route-weather-cli`, but can also back a web front end or
//! any other caller that has a list of place names.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use aggregate::{RouteAggregator, RouteReport, RouteResult};
pub use classify::Classification;
pub use config::{Config, ForecastDays, Limits};
pub use error::{PartialReason, PlaceError, ProviderError};
pub use model::{
    DailyOutlook, ForecastSeries, GeoPoint, ParameterKind, ParameterPoint, PlaceQuery,
    ResolvedPlace, WeatherRecord,
};
pub use provider::{WeatherProvider, accuweather::AccuWeatherProvider, provider_from_config};
