use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::{
    config::Limits,
    error::{PlaceError, ProviderError},
    model::{RawConditions, RawForecast, ResolvedPlace},
    provider::WeatherProvider,
};

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Per-call timeout and retry budget for upstream data calls.
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub retries: u32,
}

impl From<&Limits> for FetchPolicy {
    fn from(limits: &Limits) -> Self {
        Self { timeout: limits.request_timeout(), retries: limits.retries }
    }
}

/// Whatever could be fetched for one place. At least one side is present.
#[derive(Debug, Clone, Default)]
pub struct FetchedWeather {
    pub conditions: Option<RawConditions>,
    pub forecast: Option<RawForecast>,
}

/// Fetches current conditions and forecast for `place` concurrently.
///
/// One side failing leaves that side `None`; both failing makes the place
/// unavailable.
pub async fn fetch_weather(
    provider: &dyn WeatherProvider,
    place: &ResolvedPlace,
    policy: FetchPolicy,
) -> Result<FetchedWeather, PlaceError> {
    let id = place.location_id.as_str();

    let (conditions, forecast) = tokio::join!(
        with_retries("current conditions", &place.name, policy, || {
            provider.current_conditions(id, policy.timeout)
        }),
        with_retries("forecast", &place.name, policy, || provider.daily_forecast(id, policy.timeout)),
    );

    match (conditions, forecast) {
        (Err(conditions_err), Err(forecast_err)) => {
            warn!(
                place = %place.name,
                conditions = %conditions_err,
                forecast = %forecast_err,
                "Both weather sources failed"
            );
            Err(PlaceError::unavailable(place.name.as_str()))
        }
        (conditions, forecast) => {
            if let Err(err) = &conditions {
                warn!(place = %place.name, error = %err, "Current conditions unavailable");
            }
            if let Err(err) = &forecast {
                warn!(place = %place.name, error = %err, "Forecast unavailable");
            }
            Ok(FetchedWeather { conditions: conditions.ok(), forecast: forecast.ok() })
        }
    }
}

/// Runs `call` under `timeout`, whatever the provider does with its own deadline.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    tokio::time::timeout(timeout, call).await.unwrap_or(Err(ProviderError::Timeout))
}

async fn with_retries<T, F, Fut>(
    what: &str,
    place: &str,
    policy: FetchPolicy,
    mut call: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match bounded(policy.timeout, call()).await {
            Ok(value) => {
                debug!(place, what, attempt, "Fetched");
                return Ok(value);
            }
            Err(err) if err.is_transient() && attempt < policy.retries => {
                attempt += 1;
                warn!(place, what, error = %err, attempt, "Retrying upstream call");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, conditions, forecast};

    fn place() -> ResolvedPlace {
        ResolvedPlace {
            name: "Riga".into(),
            location_id: "225780".into(),
            latitude: 56.95,
            longitude: 24.1,
        }
    }

    fn policy(retries: u32) -> FetchPolicy {
        FetchPolicy { timeout: Duration::from_secs(2), retries }
    }

    #[tokio::test(start_paused = true)]
    async fn both_sources_present() {
        let provider = ScriptedProvider::default()
            .with_conditions("225780", Ok(conditions(70.0, 10.0)))
            .with_forecast("225780", Ok(forecast(21.0, 40.0)));

        let fetched = fetch_weather(&provider, &place(), policy(0)).await.unwrap();
        assert!(fetched.conditions.is_some());
        assert!(fetched.forecast.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_leaves_the_other_source() {
        let provider = ScriptedProvider::default()
            .with_conditions("225780", Err(ProviderError::HttpStatus(403)))
            .with_forecast("225780", Ok(forecast(21.0, 40.0)));

        let fetched = fetch_weather(&provider, &place(), policy(0)).await.unwrap();
        assert!(fetched.conditions.is_none());
        assert!(fetched.forecast.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn both_failures_make_place_unavailable() {
        let provider = ScriptedProvider::default()
            .with_conditions("225780", Err(ProviderError::HttpStatus(500)))
            .with_forecast("225780", Err(ProviderError::Malformed("eof".into())));

        let err = fetch_weather(&provider, &place(), policy(0)).await.unwrap_err();
        assert_eq!(err, PlaceError::unavailable("Riga"));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried() {
        let provider = ScriptedProvider::default()
            .with_conditions("225780", Err(ProviderError::HttpStatus(503)))
            .with_conditions("225780", Ok(conditions(70.0, 10.0)))
            .with_forecast("225780", Ok(forecast(21.0, 40.0)));

        let fetched = fetch_weather(&provider, &place(), policy(1)).await.unwrap();
        assert!(fetched.conditions.is_some());
        assert_eq!(provider.calls("conditions", "225780"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_not_retried() {
        let provider = ScriptedProvider::default()
            .with_conditions("225780", Err(ProviderError::HttpStatus(401)))
            .with_conditions("225780", Ok(conditions(70.0, 10.0)))
            .with_forecast("225780", Ok(forecast(21.0, 40.0)));

        let fetched = fetch_weather(&provider, &place(), policy(3)).await.unwrap();
        assert!(fetched.conditions.is_none());
        assert_eq!(provider.calls("conditions", "225780"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out_without_sinking_the_other() {
        let provider = ScriptedProvider::default()
            .with_conditions("225780", Ok(conditions(70.0, 10.0)))
            .with_conditions_delay("225780", Duration::from_secs(60))
            .with_forecast("225780", Ok(forecast(21.0, 40.0)));

        let fetched = fetch_weather(&provider, &place(), policy(0)).await.unwrap();
        assert!(fetched.conditions.is_none());
        assert!(fetched.forecast.is_some());
    }
}
