use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    model::Coordinates,
    resolver::{
        DEFAULT_MAX_RETRIES, DEFAULT_MAXIMUM_AGE, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT,
        PositionOptions,
    },
};

/// Overrides `api_base` from the config file when set.
pub const API_BASE_ENV: &str = "WEATHER_DASH_API_BASE";

/// Tuning for device position lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationSettings {
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
    pub enable_high_accuracy: bool,
    pub retry_delay_ms: u64,
    pub max_retries: u32,
}

impl Default for GeolocationSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            maximum_age_ms: DEFAULT_MAXIMUM_AGE.as_millis() as u64,
            enable_high_accuracy: false,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl GeolocationSettings {
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            maximum_age: Duration::from_millis(self.maximum_age_ms),
            enable_high_accuracy: self.enable_high_accuracy,
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_base = "http://localhost:8000"
///
/// [position]
/// lat = 52.52
/// lon = 13.405
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Base URL of the dashboard backend.
    pub api_base: Option<String>,

    /// Fixed device position used when resolving "here".
    pub position: Option<Coordinates>,

    #[serde(default)]
    pub geolocation: GeolocationSettings,
}

impl Config {
    /// Backend base URL, from the environment first, then the config file.
    pub fn api_base(&self) -> Result<String> {
        self.resolve_api_base(std::env::var(API_BASE_ENV).ok())
    }

    /// A blank environment value counts as unset.
    fn resolve_api_base(&self, from_env: Option<String>) -> Result<String> {
        from_env
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| self.api_base.clone())
            .ok_or_else(|| {
                anyhow!(
                    "No API base URL configured.\n\
                     Hint: run `weather-dash configure` or set {API_BASE_ENV}."
                )
            })
    }

    pub fn set_api_base(&mut self, api_base: impl Into<String>) {
        self.api_base = Some(api_base.into().trim_end_matches('/').to_string());
    }

    pub fn set_position(&mut self, position: Coordinates) {
        self.position = Some(position);
    }

    pub fn clear_position(&mut self) {
        self.position = None;
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
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

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(&path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dash", "weather-dash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
