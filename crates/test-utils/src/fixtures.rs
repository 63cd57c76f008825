//! Common test fixtures for era5-tmax tests.
//!
//! [`BundleFixture`] writes NetCDF files laid out like the archive's
//! daily-statistics deliveries: a `t2m` field over
//! `(valid_time, latitude, longitude)` in Kelvin.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::generators::{create_constant_grid, create_tmax_grid};

/// How the time axis of a fixture is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEncoding {
    /// `valid_time` in `seconds since 1970-01-01` (current archive output)
    UnixSeconds,
    /// `time` in `hours since 1900-01-01 00:00:00.0` (legacy archive output)
    HoursSince1900,
}

/// Builder for synthetic bundle files.
#[derive(Debug, Clone)]
pub struct BundleFixture {
    pub dates: Vec<NaiveDate>,
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
    /// Time-major values in Kelvin, `dates.len() * lats.len() * lons.len()`
    pub values: Vec<f32>,
    pub variable: String,
    pub time_encoding: TimeEncoding,
}

impl BundleFixture {
    /// Days `1..=days` of a month over a 4x3 grid, with a gradient field.
    pub fn month(year: i32, month: u32, days: u32) -> Self {
        let dates: Vec<NaiveDate> = (1..=days)
            .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
            .collect();
        Self::for_dates(dates)
    }

    /// Explicit dates over a 4x3 grid, with a gradient field.
    pub fn for_dates(dates: Vec<NaiveDate>) -> Self {
        let lons = vec![10.0, 10.1, 10.2, 10.3];
        let lats = vec![45.2, 45.1, 45.0];
        let values = (0..dates.len())
            .flat_map(|i| create_tmax_grid(lons.len(), lats.len(), i as u32))
            .collect();

        Self {
            dates,
            lons,
            lats,
            values,
            variable: "t2m".to_string(),
            time_encoding: TimeEncoding::UnixSeconds,
        }
    }

    /// Replace every value with `kelvin`.
    pub fn constant(mut self, kelvin: f32) -> Self {
        self.values = (0..self.dates.len())
            .flat_map(|_| create_constant_grid(self.lons.len(), self.lats.len(), kelvin))
            .collect();
        self
    }

    /// Store latitudes south-first, keeping the field geographically identical.
    pub fn south_first(mut self) -> Self {
        let width = self.lons.len();
        let height = self.lats.len();
        self.lats.reverse();
        for day in self.values.chunks_mut(width * height) {
            let rows: Vec<Vec<f32>> = day.chunks(width).rev().map(|r| r.to_vec()).collect();
            for (dst, src) in day.chunks_mut(width).zip(rows) {
                dst.copy_from_slice(&src);
            }
        }
        self
    }

    pub fn time_encoding(mut self, encoding: TimeEncoding) -> Self {
        self.time_encoding = encoding;
        self
    }

    pub fn variable(mut self, name: &str) -> Self {
        self.variable = name.to_string();
        self
    }

    /// Number of cells per day.
    pub fn cells(&self) -> usize {
        self.lons.len() * self.lats.len()
    }

    /// Write the fixture as a NetCDF file.
    pub fn write(&self, path: &Path) -> Result<(), netcdf::Error> {
        let (time_name, units, epoch, step_secs) = match self.time_encoding {
            TimeEncoding::UnixSeconds => ("valid_time", "seconds since 1970-01-01", epoch(1970), 1),
            TimeEncoding::HoursSince1900 => {
                ("time", "hours since 1900-01-01 00:00:00.0", epoch(1900), 3600)
            }
        };
        let times: Vec<f64> = self
            .dates
            .iter()
            .map(|d| {
                let midnight = d.and_hms_opt(0, 0, 0).unwrap_or_default();
                ((midnight - epoch).num_seconds() / step_secs) as f64
            })
            .collect();

        let mut file = netcdf::create(path)?;
        file.add_dimension(time_name, self.dates.len())?;
        file.add_dimension("latitude", self.lats.len())?;
        file.add_dimension("longitude", self.lons.len())?;

        let mut time = file.add_variable::<f64>(time_name, &[time_name])?;
        time.put_attribute("units", units)?;
        time.put_attribute("calendar", "proleptic_gregorian")?;
        time.put_values(&times, ..)?;

        let mut lat = file.add_variable::<f64>("latitude", &["latitude"])?;
        lat.put_attribute("units", "degrees_north")?;
        lat.put_values(&self.lats, ..)?;

        let mut lon = file.add_variable::<f64>("longitude", &["longitude"])?;
        lon.put_attribute("units", "degrees_east")?;
        lon.put_values(&self.lons, ..)?;

        let mut field =
            file.add_variable::<f32>(&self.variable, &[time_name, "latitude", "longitude"])?;
        field.put_attribute("units", "K")?;
        field.put_attribute("long_name", "2 metre temperature")?;
        field.put_values(&self.values, ..)?;

        Ok(())
    }
}

fn epoch(year: i32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}
