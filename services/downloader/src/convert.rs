//! Bundle to daily GeoTIFF conversion.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use geotiff_writer::{write_geotiff, GeoTiffError, GeoTiffOptions};
use netcdf_parser::{DailyBundle, NetCdfError};
use thiserror::Error;
use tmax_common::YearMonth;
use tracing::{debug, info, warn};

use crate::layout::OutputLayout;

/// Bundle variable holding 2 m temperature.
pub const TEMPERATURE_VARIABLE: &str = "t2m";

pub const KELVIN_OFFSET: f32 = 273.15;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to read bundle {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: NetCdfError,
    },

    #[error("Failed to write raster for {date}: {source}")]
    Write {
        date: NaiveDate,
        #[source]
        source: GeoTiffError,
    },
}

/// Days handled by one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertReport {
    pub written: usize,
    pub skipped: usize,
}

pub fn kelvin_to_celsius(kelvin: f32) -> f32 {
    kelvin - KELVIN_OFFSET
}

/// Write one Celsius raster per day in `bundle_path`.
///
/// Days whose raster already exists are left untouched. The first error
/// stops the conversion; rasters written before it stay in place. A bundle
/// without days converts to nothing and is not an error.
pub fn convert_bundle(
    bundle_path: &Path,
    month: YearMonth,
    layout: &OutputLayout,
) -> Result<ConvertReport, ConvertError> {
    info!(year = month.year(), month = month.month(), "Converting {} to GeoTIFF", month);

    let bundle = DailyBundle::open(bundle_path, TEMPERATURE_VARIABLE).map_err(|source| {
        ConvertError::Read {
            path: bundle_path.to_path_buf(),
            source,
        }
    })?;

    let report = write_days(&bundle, month, layout)?;

    info!(
        year = month.year(),
        month = month.month(),
        written = report.written,
        skipped = report.skipped,
        "Converted {} days for {}",
        report.written,
        month
    );

    Ok(report)
}

fn write_days(
    bundle: &DailyBundle,
    month: YearMonth,
    layout: &OutputLayout,
) -> Result<ConvertReport, ConvertError> {
    if bundle.is_empty() {
        warn!(%month, "Bundle contains no days");
    }

    let options = GeoTiffOptions::default();
    let mut report = ConvertReport::default();

    for (date, kelvin) in bundle.days() {
        if !month.contains(date) {
            warn!(%date, %month, "Bundle day outside requested month");
        }

        let path = layout.raster_path(date);
        if path.exists() {
            debug!(%date, path = %path.display(), "Raster exists, skipping");
            report.skipped += 1;
            continue;
        }

        let celsius: Vec<f32> = kelvin.iter().map(|&k| kelvin_to_celsius(k)).collect();
        write_geotiff(&path, &bundle.grid, &celsius, &options)
            .map_err(|source| ConvertError::Write { date, source })?;
        report.written += 1;
    }

    Ok(report)
}
