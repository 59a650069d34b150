use crate::{
    Config,
    error::ProviderError,
    model::{LocationRef, RawConditions, RawForecast},
    provider::accuweather::AccuWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod accuweather;

/// Upstream weather source. One outbound call per method invocation, no
/// caching and no retries.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Candidates for a free-text place name, most relevant first.
    async fn search_places(
        &self,
        query: &str,
        timeout: Duration,
    ) -> Result<Vec<LocationRef>, ProviderError>;

    async fn current_conditions(
        &self,
        location_id: &str,
        timeout: Duration,
    ) -> Result<RawConditions, ProviderError>;

    async fn daily_forecast(
        &self,
        location_id: &str,
        timeout: Duration,
    ) -> Result<RawForecast, ProviderError>;
}

/// Construct the provider described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `route-weather configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    let provider = AccuWeatherProvider::new(
        api_key.to_owned(),
        config.base_url.clone(),
        config.forecast_days,
    )?;

    Ok(Box::new(provider))
}
