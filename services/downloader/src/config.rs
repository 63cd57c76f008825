//! Configuration loading for the downloader.
//!
//! A single YAML file describes where rasters go, which area to request and
//! the default period. Every section except `paths` is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tmax_common::{Area, MonthRange, YearMonth};
use tracing::debug;

/// Dataset holding the ERA5-Land daily aggregates.
pub const DEFAULT_DATASET: &str = "derived-era5-land-daily-statistics";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    /// `[north, west, south, east]`
    #[serde(default = "Area::italy")]
    pub area: Area,
    /// Seconds to wait between months
    #[serde(default = "default_download_delay")]
    pub download_delay: f64,
    #[serde(default)]
    pub period: PeriodConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_download_delay() -> f64 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub base_dir: PathBuf,
}

/// Range processed when the command line names none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodConfig {
    pub start_year: i32,
    #[serde(default = "default_start_month")]
    pub start_month: u32,
    pub end_year: i32,
    #[serde(default = "default_end_month")]
    pub end_month: u32,
}

fn default_start_month() -> u32 {
    1
}

fn default_end_month() -> u32 {
    12
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            start_year: 1979,
            start_month: 1,
            end_year: 2024,
            end_month: 12,
        }
    }
}

impl PeriodConfig {
    pub fn range(&self) -> Result<MonthRange, ConfigError> {
        let start = year_month(self.start_year, self.start_month)?;
        let end = year_month(self.end_year, self.end_month)?;
        Ok(MonthRange::new(start, end))
    }
}

pub(crate) fn year_month(year: i32, month: u32) -> Result<YearMonth, ConfigError> {
    YearMonth::new(year, month).map_err(|e| ConfigError::Invalid(e.to_string()))
}

/// Archive service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_dataset")]
    pub dataset: String,
    /// Seconds between job status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Timeout for a single HTTP request, including the bundle download
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_dataset() -> String {
    DEFAULT_DATASET.to_string()
}

fn default_poll_interval() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    600 // 10 minutes
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file written alongside console output; `null` disables it
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("era5_download.log"))
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

impl Default for Config {
    /// Configuration used when no file is given.
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                base_dir: PathBuf::from("ERA5_Tmax"),
            },
            area: Area::italy(),
            download_delay: default_download_delay(),
            period: PeriodConfig::default(),
            archive: ArchiveConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        debug!(path = %path.display(), base_dir = %config.paths.base_dir.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that serde cannot express. The area is validated on parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Duration::try_from_secs_f64(self.download_delay).is_err() {
            return Err(ConfigError::Invalid(format!(
                "download_delay must be a non-negative number of seconds, got {}",
                self.download_delay
            )));
        }
        if self.archive.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "archive.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.archive.dataset.trim().is_empty() {
            return Err(ConfigError::Invalid("archive.dataset is empty".to_string()));
        }
        self.period.range()?;
        Ok(())
    }

    /// Pause between months; zero for a delay `validate` would reject.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.download_delay).unwrap_or_default()
    }
}
