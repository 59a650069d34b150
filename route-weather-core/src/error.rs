use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::model::ParameterKind;

/// Failure of a single upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream responded with HTTP status {0}")]
    HttpStatus(u16),

    #[error("malformed upstream payload: {0}")]
    Malformed(String),

    #[error("upstream transport failure: {0}")]
    Transport(String),
}

impl ProviderError {
    /// Whether another attempt at the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout | ProviderError::Transport(_) => true,
            ProviderError::HttpStatus(code) => *code == 429 || (500..600).contains(code),
            ProviderError::Malformed(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if let Some(status) = err.status() {
            ProviderError::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Why a place ended up as [`PlaceError::PartialData`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PartialReason {
    /// The requested display parameter is not one we know.
    UnknownParameter(String),
    /// A record exists but some of its fields fell back to sentinels.
    MissingFields(BTreeSet<ParameterKind>),
}

impl fmt::Display for PartialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialReason::UnknownParameter(name) => write!(f, "unknown parameter '{name}'"),
            PartialReason::MissingFields(fields) => {
                let names: Vec<&str> = fields.iter().map(ParameterKind::as_str).collect();
                write!(f, "missing fields: {}", names.join(", "))
            }
        }
    }
}

/// Outcome of a place that did not produce a usable record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum PlaceError {
    #[error("place '{place}' was not found")]
    NotFound { place: String },

    #[error("weather data for '{place}' is unavailable")]
    UpstreamUnavailable { place: String },

    #[error("partial data for '{place}': {reason}")]
    PartialData { place: String, reason: PartialReason },
}

impl PlaceError {
    pub fn not_found(place: impl Into<String>) -> Self {
        PlaceError::NotFound { place: place.into() }
    }

    pub fn unavailable(place: impl Into<String>) -> Self {
        PlaceError::UpstreamUnavailable { place: place.into() }
    }

    pub fn partial(place: impl Into<String>, reason: PartialReason) -> Self {
        PlaceError::PartialData { place: place.into(), reason }
    }

    /// Name of the place this error originated from.
    pub fn place(&self) -> &str {
        match self {
            PlaceError::NotFound { place }
            | PlaceError::UpstreamUnavailable { place }
            | PlaceError::PartialData { place, .. } => place,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_timeouts_transport_and_server_side() {
        assert!(ProviderError::Timeout.is_transient());
        assert!(ProviderError::Transport("reset".into()).is_transient());
        assert!(ProviderError::HttpStatus(503).is_transient());
        assert!(ProviderError::HttpStatus(429).is_transient());

        assert!(!ProviderError::HttpStatus(401).is_transient());
        assert!(!ProviderError::HttpStatus(404).is_transient());
        assert!(!ProviderError::Malformed("eof".into()).is_transient());
    }

    #[test]
    fn place_error_keeps_originating_place() {
        let err = PlaceError::partial("Oslo", PartialReason::UnknownParameter("pressure".into()));
        assert_eq!(err.place(), "Oslo");
        assert!(err.to_string().contains("unknown parameter 'pressure'"));

        assert_eq!(PlaceError::not_found("Nowhere").place(), "Nowhere");
    }

    #[test]
    fn missing_fields_reason_lists_field_names() {
        let reason = PartialReason::MissingFields(
            [ParameterKind::Humidity, ParameterKind::Temperature].into_iter().collect(),
        );
        assert_eq!(reason.to_string(), "missing fields: temperature, humidity");
    }
}
