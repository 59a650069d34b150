use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "ROUTE_WEATHER_API_KEY";

pub const DEFAULT_BASE_URL: &str = "http://dataservice.accuweather.com";

/// Forecast range requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum ForecastDays {
    #[default]
    One,
    Five,
}

impl ForecastDays {
    pub fn count(&self) -> u8 {
        match self {
            ForecastDays::One => 1,
            ForecastDays::Five => 5,
        }
    }
}

impl TryFrom<u8> for ForecastDays {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ForecastDays::One),
            5 => Ok(ForecastDays::Five),
            other => Err(format!("forecast_days must be 1 or 5, got {other}")),
        }
    }
}

impl From<ForecastDays> for u8 {
    fn from(days: ForecastDays) -> Self {
        days.count()
    }
}

/// Timeouts and fan-out limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Per upstream call.
    pub request_timeout_secs: u64,
    /// Whole route.
    pub deadline_secs: u64,
    /// Places processed at the same time.
    pub worker_limit: usize,
    /// Extra attempts for a transient upstream failure.
    pub retries: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self { request_timeout_secs: 10, deadline_secs: 30, worker_limit: 4, retries: 1 }
    }
}

impl Limits {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn worker_limit(&self) -> usize {
        self.worker_limit.max(1)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// forecast_days = 5
///
/// [limits]
/// worker_limit = 2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub forecast_days: ForecastDays,
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            forecast_days: ForecastDays::default(),
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    ///
    /// This is what is stored; see [`Config::load_effective`] for the
    /// configuration to actually run with.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Stored config with the API key from the environment applied on top.
    pub fn load_effective() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.override_api_key(env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    /// Replaces the key with `key` unless it is absent or blank.
    pub fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.set_api_key(key);
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "route-weather", "route-weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Blank keys are treated as "not configured".
    pub fn set_api_key(&mut self, key: String) {
        let key = key.trim();
        self.api_key = (!key.is_empty()).then(|| key.to_string());
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
