//! Multi-day bundles as delivered by the ERA5 daily-statistics archive.
//!
//! A bundle holds one single-variable field over a `(time, latitude,
//! longitude)` cube. The archive has used both `valid_time`/`time` for the
//! time axis and `latitude`/`lat` for the spatial axes, so all spellings are
//! accepted.

use std::path::Path;

use chrono::NaiveDate;
use tmax_common::grid::latitudes_ascending;
use tmax_common::GeoGrid;
use tracing::{debug, warn};

use crate::cf_time::CfTimeUnits;
use crate::error::{NetCdfError, NetCdfResult};
use crate::native;

const TIME_NAMES: [&str; 2] = ["valid_time", "time"];
const LAT_NAMES: [&str; 2] = ["latitude", "lat"];
const LON_NAMES: [&str; 2] = ["longitude", "lon"];

/// A decoded multi-day bundle.
///
/// Values are unpacked (scale/offset applied, fill values as NaN) and stored
/// time-major with north-up rows, so each day slice can be written as a
/// raster without further reordering.
#[derive(Debug, Clone)]
pub struct DailyBundle {
    /// Name of the field variable (e.g. `t2m`)
    pub variable: String,
    /// `units` attribute of the field, if present
    pub units: Option<String>,
    /// Calendar date of each time step
    pub dates: Vec<NaiveDate>,
    /// Spatial grid shared by every time step
    pub grid: GeoGrid,
    values: Vec<f32>,
}

impl DailyBundle {
    /// Assemble a bundle from already-decoded parts.
    pub fn from_parts(
        variable: impl Into<String>,
        dates: Vec<NaiveDate>,
        grid: GeoGrid,
        values: Vec<f32>,
    ) -> NetCdfResult<Self> {
        if values.len() != dates.len() * grid.len() {
            return Err(NetCdfError::InvalidFormat(format!(
                "expected {} values for {} days of {}x{}, got {}",
                dates.len() * grid.len(),
                dates.len(),
                grid.width,
                grid.height,
                values.len()
            )));
        }

        Ok(Self {
            variable: variable.into(),
            units: None,
            dates,
            grid,
            values,
        })
    }

    /// Open a bundle file and decode `variable`.
    pub fn open<P: AsRef<Path>>(path: P, variable: &str) -> NetCdfResult<Self> {
        let path = path.as_ref();
        let file = native::open(path)?;

        let field = file
            .variable(variable)
            .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", variable)))?;

        let (time_name, time_var) = native::find_variable(&file, &TIME_NAMES)
            .ok_or_else(|| NetCdfError::MissingData("time coordinate variable".to_string()))?;
        let (lat_name, lat_var) = native::find_variable(&file, &LAT_NAMES)
            .ok_or_else(|| NetCdfError::MissingData("latitude coordinate variable".to_string()))?;
        let (lon_name, lon_var) = native::find_variable(&file, &LON_NAMES)
            .ok_or_else(|| NetCdfError::MissingData("longitude coordinate variable".to_string()))?;

        let dims = native::dimension_names(&field);
        if dims != [time_name.as_str(), lat_name.as_str(), lon_name.as_str()] {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} has dimensions {:?}, expected [{}, {}, {}]",
                variable, dims, time_name, lat_name, lon_name
            )));
        }

        let time_units = native::get_string_attr(&time_var, "units")
            .ok_or_else(|| NetCdfError::MissingData(format!("units attribute on {}", time_name)))?;
        let time_units = CfTimeUnits::parse(&time_units)?;
        let dates = native::read_f64(&time_var, &time_name)?
            .into_iter()
            .map(|v| time_units.to_date(v))
            .collect::<NetCdfResult<Vec<_>>>()?;

        let lats = native::read_f64(&lat_var, &lat_name)?;
        let lons = native::read_f64(&lon_var, &lon_name)?;
        let grid = GeoGrid::from_axes(&lons, &lats)?;

        let raw = native::read_f64(&field, variable)?;
        let packing = Packing {
            scale_factor: native::get_f64_attr(&field, "scale_factor").unwrap_or(1.0),
            add_offset: native::get_f64_attr(&field, "add_offset").unwrap_or(0.0),
            fill_value: native::get_f64_attr(&field, "_FillValue"),
            missing_value: native::get_f64_attr(&field, "missing_value"),
        };
        let mut values: Vec<f32> = raw.iter().map(|&v| packing.unpack(v)).collect();

        if latitudes_ascending(&lats) {
            debug!(variable, "Latitude axis is south-first, flipping rows");
            flip_rows(&mut values, grid.width, grid.height);
        }

        let mut bundle = Self::from_parts(variable, dates, grid, values)?;
        bundle.units = native::get_string_attr(&field, "units");

        if bundle.units.as_deref().is_some_and(|u| u != "K") {
            warn!(
                variable,
                units = ?bundle.units,
                "Field units are not Kelvin"
            );
        }

        debug!(
            path = %path.display(),
            variable,
            days = bundle.len(),
            width = grid.width,
            height = grid.height,
            "Opened bundle"
        );

        Ok(bundle)
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The 2-D north-up slice of time step `index`.
    pub fn day(&self, index: usize) -> Option<&[f32]> {
        let size = self.grid.len();
        let start = index.checked_mul(size)?;
        self.values.get(start..start + size)
    }

    /// Iterate `(date, slice)` pairs in time-axis order.
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &[f32])> + '_ {
        self.dates
            .iter()
            .enumerate()
            .filter_map(|(i, date)| self.day(i).map(|slice| (*date, slice)))
    }
}

/// CF packing attributes of a field variable.
struct Packing {
    scale_factor: f64,
    add_offset: f64,
    fill_value: Option<f64>,
    missing_value: Option<f64>,
}

impl Packing {
    fn unpack(&self, raw: f64) -> f32 {
        if Some(raw) == self.fill_value || Some(raw) == self.missing_value || !raw.is_finite() {
            f32::NAN
        } else {
            (raw * self.scale_factor + self.add_offset) as f32
        }
    }
}

/// Reverse row order of every time slice in place.
fn flip_rows(values: &mut [f32], width: usize, height: usize) {
    let size = width * height;
    if size == 0 {
        return;
    }
    for slice in values.chunks_mut(size) {
        for row in 0..height / 2 {
            let (top, bottom) = slice.split_at_mut((height - 1 - row) * width);
            top[row * width..(row + 1) * width].swap_with_slice(&mut bottom[..width]);
        }
    }
}
