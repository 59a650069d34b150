use std::fmt;

use route_weather_core::{ParameterKind, RouteReport, WeatherRecord};

/// Plain-text rendering of a route report, one block per place.
pub struct RouteText<'a>(pub &'a RouteReport);

impl fmt::Display for RouteText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        for result in &report.results {
            match result {
                Ok(record) => write_record(f, record)?,
                Err(err) => writeln!(f, "{}: {err}\n", err.place())?,
            }
        }

        if let Some(parameter) = report.parameter {
            writeln!(f, "{parameter} along the route:")?;
            if report.parameter_series.is_empty() {
                writeln!(f, "  (no places to show)")?;
            }
            for point in &report.parameter_series {
                match point.display_value {
                    Some(v) => writeln!(f, "  {:<24} {v:>7.1} {}", point.place, parameter.unit())?,
                    None => writeln!(f, "  {:<24} {:>7}", point.place, "n/a")?,
                }
            }
        }

        Ok(())
    }
}

fn write_record(f: &mut fmt::Formatter<'_>, record: &WeatherRecord) -> fmt::Result {
    writeln!(f, "{} ({:.4}, {:.4})", record.place, record.latitude, record.longitude)?;
    for field in ParameterKind::all() {
        match record.display_value(*field) {
            Some(v) if !record.is_missing(*field) => {
                writeln!(f, "  {:<18} {v:.1} {}", field.as_str(), field.unit())?
            }
            _ => writeln!(f, "  {:<18} n/a", field.as_str())?,
        }
    }
    writeln!(f, "  {}\n", record.classification)
}
