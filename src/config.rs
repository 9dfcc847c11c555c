//! Application configuration

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;

use crate::errors::FlightTrackerError;

pub const DEFAULT_FEED_URL: &str =
    "https://public-api.adsbexchange.com/VirtualRadar/AircraftList.json";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub updater: UpdaterConfig,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Request timeout, the only timeout applied to a snapshot fetch
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_feed_timeout")]
    pub timeout: Duration,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct UpdaterConfig {
    /// Maximum number of records written by the overwrite phase
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Delay between refresh cycles
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_interval")]
    pub interval: Duration,
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_feed_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_connections() -> u32 {
    5
}

// Kept low, larger snapshots overload constrained networks
fn default_limit() -> usize {
    300
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            timeout: default_feed_timeout(),
        }
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            interval: default_interval(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("FLIGHTTRACKER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), FlightTrackerError> {
        self.feed.validate()?;
        self.database.validate()?;
        self.updater.validate()?;
        Ok(())
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), FlightTrackerError> {
        if self.url.trim().is_empty() {
            return Err(configuration_error("Feed URL cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(configuration_error("Feed timeout must be greater than zero"));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), FlightTrackerError> {
        if self.url.trim().is_empty() {
            return Err(configuration_error("Database URL cannot be empty"));
        }
        if self.max_connections == 0 {
            return Err(configuration_error(
                "Database max_connections must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl UpdaterConfig {
    pub fn validate(&self) -> Result<(), FlightTrackerError> {
        if self.limit == 0 {
            return Err(configuration_error("Updater limit must be greater than zero"));
        }
        if self.interval.is_zero() {
            return Err(configuration_error(
                "Updater interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn configuration_error(message: &str) -> FlightTrackerError {
    FlightTrackerError::ConfigurationError {
        message: message.to_string(),
    }
}
