//! ERA5-Land daily maximum temperature downloader.
//!
//! Retrieves one month at a time from the Copernicus Climate Data Store and
//! writes one Celsius GeoTIFF per day:
//! - Months with enough rasters on disk are skipped without contacting the archive
//! - Existing daily rasters are never overwritten
//! - The monthly NetCDF bundle is removed whatever the outcome
//! - A failed month is reported and the run moves on

pub mod cds;
pub mod cli;
pub mod completeness;
pub mod config;
pub mod convert;
pub mod layout;
pub mod logging;
pub mod month;
pub mod period;
pub mod request;

pub use cds::{ArchiveClient, ArchiveError, CdsClient, CdsCredentials};
pub use completeness::{is_month_complete, MIN_EXPECTED_DAYS};
pub use config::{Config, ConfigError};
pub use convert::{convert_bundle, ConvertError, ConvertReport};
pub use layout::OutputLayout;
pub use month::{MonthError, MonthFetcher, MonthOutcome, MonthResult};
pub use period::{PeriodRunner, PeriodSummary};
pub use request::RetrievalRequest;
