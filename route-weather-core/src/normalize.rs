//! Merging of current conditions and forecast into one [`WeatherRecord`].

use std::collections::BTreeSet;

use crate::classify::Classification;
use crate::model::{
    DailyOutlook, ParameterKind, RawConditions, RawForecast, ResolvedPlace, WeatherRecord,
};

/// Probability reported when rain is being observed right now.
const OBSERVED_RAIN_PCT: f64 = 100.0;

/// Builds the canonical record for `place`.
///
/// Returns `None` when neither source is present; the caller reports the
/// place as unavailable instead.
pub fn normalize(
    place: &ResolvedPlace,
    conditions: Option<&RawConditions>,
    forecast: Option<&RawForecast>,
) -> Option<WeatherRecord> {
    if conditions.is_none() && forecast.is_none() {
        return None;
    }

    let today = forecast.and_then(RawForecast::today);

    // Never taken from current conditions.
    let temperature_c = today.and_then(|day| day.max_temperature_c);

    let wind_speed_kmh = match conditions {
        Some(current) => current.wind_speed_kmh,
        None => today.and_then(|day| day.wind_speed_kmh),
    };

    let humidity_pct = conditions.and_then(|current| current.relative_humidity);

    let rain_probability_pct = if conditions.is_some_and(RawConditions::is_raining) {
        Some(OBSERVED_RAIN_PCT)
    } else {
        today.and_then(|day| day.rain_probability_pct)
    };

    let missing_fields: BTreeSet<ParameterKind> = [
        (ParameterKind::Temperature, temperature_c),
        (ParameterKind::WindSpeed, wind_speed_kmh),
        (ParameterKind::Humidity, humidity_pct),
        (ParameterKind::RainProbability, rain_probability_pct),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.is_none().then_some(field))
    .collect();

    let classification = Classification::classify(
        temperature_c,
        wind_speed_kmh.unwrap_or(0.0),
        rain_probability_pct.unwrap_or(0.0),
    );

    let outlook = forecast
        .map(|f| f.days.iter().map(DailyOutlook::from).collect())
        .unwrap_or_default();

    Some(WeatherRecord {
        place: place.name.clone(),
        latitude: place.latitude,
        longitude: place.longitude,
        temperature_c,
        wind_speed_kmh,
        humidity_pct,
        rain_probability_pct,
        classification,
        missing_fields,
        outlook,
    })
}
