//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use tmax_common::MonthRange;

use crate::config::{year_month, ConfigError, PeriodConfig};
use crate::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "era5-tmax")]
#[command(about = "Download ERA5-Land daily maximum temperature as daily GeoTIFFs")]
pub struct Args {
    /// Configuration file (YAML); built-in defaults when absent
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Specific year to download
    #[arg(long, conflicts_with = "start_year")]
    pub year: Option<i32>,

    /// Specific month to download (requires --year)
    #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Start year for range download
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Start month
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub start_month: u32,

    /// End year for range download (default: start year)
    #[arg(long)]
    pub end_year: Option<i32>,

    /// End month
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub end_month: u32,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Console log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Args {
    /// Months to process: `--year [--month]`, else `--start-year ...`,
    /// else the configured period.
    pub fn resolve_range(&self, period: &PeriodConfig) -> Result<MonthRange, ConfigError> {
        let range = if let Some(year) = self.year {
            match self.month {
                Some(month) => MonthRange::single(year_month(year, month)?),
                None => MonthRange::year(year),
            }
        } else if let Some(start_year) = self.start_year {
            let end_year = self.end_year.unwrap_or(start_year);
            MonthRange::new(
                year_month(start_year, self.start_month)?,
                year_month(end_year, self.end_month)?,
            )
        } else {
            period.range()?
        };

        if range.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "start {} is after end {}",
                range.start, range.end
            )));
        }
        Ok(range)
    }
}
