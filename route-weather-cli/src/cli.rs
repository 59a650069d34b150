use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use route_weather_core::{Config, ForecastDays, RouteAggregator};
use tracing::debug;

use crate::report;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "route-weather", version, about = "Weather along a travel route")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the AccuWeather API key and forecast range.
    Configure,

    /// Show weather for every place along a route.
    Route {
        /// Comma-separated place names, in travel order.
        places: String,

        /// Parameter to chart: temperature, rain_probability, wind_speed or humidity.
        #[arg(long, short, default_value = "temperature")]
        parameter: String,

        /// Leave places colder than this (°C) out of the parameter series.
        #[arg(long, allow_negative_numbers = true)]
        min_temp: Option<f64>,

        /// Overall deadline in seconds; overrides the configured one.
        #[arg(long)]
        deadline: Option<u64>,

        /// Places fetched at the same time; overrides the configured limit.
        #[arg(long)]
        workers: Option<usize>,

        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Route { places, parameter, min_temp, deadline, workers, json } => {
                let mut config = Config::load_effective()?;
                if let Some(workers) = workers {
                    config.limits.worker_limit = workers;
                }
                let deadline = deadline
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| config.limits.deadline());

                let places = split_places(&places);
                debug!(?places, %parameter, "Route requested");

                let aggregator = RouteAggregator::from_config(&config)?;
                let report = aggregator.aggregate(&places, &parameter, min_temp, deadline).await;

                if json {
                    let out = serde_json::to_string_pretty(&report)
                        .context("Failed to serialize route report")?;
                    println!("{out}");
                } else {
                    print!("{}", report::RouteText(&report));
                }
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("AccuWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(key);

    let days = Select::new("Forecast range (days):", vec![1u8, 5])
        .prompt()
        .context("Failed to read forecast range")?;
    config.forecast_days = ForecastDays::try_from(days).map_err(anyhow::Error::msg)?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Places are typed as one comma-separated line; empty entries stay so
/// that every position gets a result.
fn split_places(input: &str) -> Vec<String> {
    input.split(',').map(|p| p.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_places() {
        assert_eq!(split_places("Moscow, Tver ,Saint Petersburg"), ["Moscow", "Tver", "Saint Petersburg"]);
        assert_eq!(split_places("Moscow,,Tver"), ["Moscow", "", "Tver"]);
    }

    #[test]
    fn route_args_parse() {
        let cli = Cli::try_parse_from([
            "route-weather",
            "route",
            "Moscow, Tver",
            "--parameter",
            "wind_speed",
            "--min-temp",
            "-5",
            "--json",
        ])
        .expect("valid args");

        match cli.command {
            Command::Route { places, parameter, min_temp, json, .. } => {
                assert_eq!(places, "Moscow, Tver");
                assert_eq!(parameter, "wind_speed");
                assert_eq!(min_temp, Some(-5.0));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
