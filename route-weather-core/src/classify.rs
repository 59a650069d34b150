use std::fmt;

use serde::Serialize;

const MIN_TEMPERATURE_C: f64 = -30.0;
const MAX_TEMPERATURE_C: f64 = 35.0;
const MAX_WIND_SPEED_KMH: f64 = 50.0;
const MAX_RAIN_PROBABILITY_PCT: f64 = 70.0;

/// Verdict on whether conditions are fit for travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    ExtremeTemperature,
    HighWind,
    HighPrecipitationRisk,
    Favorable,
}

impl Classification {
    /// First matching rule wins; the order below is significant.
    ///
    /// An unknown temperature cannot trigger the temperature rule.
    pub fn classify(
        temperature_c: Option<f64>,
        wind_speed_kmh: f64,
        rain_probability_pct: f64,
    ) -> Self {
        if temperature_c.is_some_and(|t| !(MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&t)) {
            Classification::ExtremeTemperature
        } else if wind_speed_kmh > MAX_WIND_SPEED_KMH {
            Classification::HighWind
        } else if rain_probability_pct > MAX_RAIN_PROBABILITY_PCT {
            Classification::HighPrecipitationRisk
        } else {
            Classification::Favorable
        }
    }

    pub fn is_bad(&self) -> bool {
        !matches!(self, Classification::Favorable)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Classification::ExtremeTemperature => "Bad weather: extreme temperature",
            Classification::HighWind => "Bad weather: strong wind",
            Classification::HighPrecipitationRisk => "Bad weather: high chance of precipitation",
            Classification::Favorable => "Weather is fine",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_rule_in_isolation() {
        assert_eq!(Classification::classify(Some(40.0), 10.0, 10.0), Classification::ExtremeTemperature);
        assert_eq!(Classification::classify(Some(20.0), 60.0, 10.0), Classification::HighWind);
        assert_eq!(
            Classification::classify(Some(20.0), 10.0, 80.0),
            Classification::HighPrecipitationRisk
        );
        assert_eq!(Classification::classify(Some(20.0), 10.0, 10.0), Classification::Favorable);
    }

    #[test]
    fn thresholds_are_exclusive() {
        assert_eq!(Classification::classify(Some(35.0), 50.0, 70.0), Classification::Favorable);
        assert_eq!(Classification::classify(Some(-30.0), 0.0, 0.0), Classification::Favorable);
        assert_eq!(Classification::classify(Some(-30.5), 0.0, 0.0), Classification::ExtremeTemperature);
        assert_eq!(Classification::classify(Some(35.1), 0.0, 0.0), Classification::ExtremeTemperature);
    }

    #[test]
    fn first_matching_rule_wins() {
        assert_eq!(Classification::classify(Some(-40.0), 90.0, 95.0), Classification::ExtremeTemperature);
        assert_eq!(Classification::classify(Some(10.0), 90.0, 95.0), Classification::HighWind);
    }

    #[test]
    fn unknown_temperature_skips_temperature_rule() {
        assert_eq!(Classification::classify(None, 10.0, 10.0), Classification::Favorable);
        assert_eq!(Classification::classify(None, 10.0, 75.0), Classification::HighPrecipitationRisk);
    }

    #[test]
    fn only_favorable_is_good() {
        assert!(!Classification::Favorable.is_bad());
        assert!(Classification::HighWind.is_bad());
    }
}
