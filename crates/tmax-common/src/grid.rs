//! Regular latitude/longitude grids and their raster georeferencing.

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// Relative tolerance on coordinate spacing when checking grid regularity.
/// Archive coordinates are often stored as f32, so exact equality is too strict.
const SPACING_TOLERANCE: f64 = 1e-3;

/// A north-up regular lat/lon grid.
///
/// `origin_lon`/`origin_lat` are the outer corner of the top-left cell, which
/// is what GeoTIFF tie points with PixelIsArea expect. Rows run north to south
/// and columns west to east.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoGrid {
    /// Number of columns (longitude points)
    pub width: usize,
    /// Number of rows (latitude points)
    pub height: usize,
    /// Western edge of the first column
    pub origin_lon: f64,
    /// Northern edge of the first row
    pub origin_lat: f64,
    /// Cell size in degrees of longitude
    pub dx: f64,
    /// Cell size in degrees of latitude (positive)
    pub dy: f64,
}

impl GeoGrid {
    /// Build the grid from 1-D cell-center coordinate axes.
    ///
    /// Longitudes must increase. Latitudes may run either way; the grid is
    /// always north-up, so callers holding south-first data must flip rows
    /// (see [`latitudes_ascending`]).
    pub fn from_axes(lons: &[f64], lats: &[f64]) -> CommonResult<Self> {
        let dx = regular_step(lons, "longitude")?;
        let dy = regular_step(lats, "latitude")?;

        if dx <= 0.0 {
            return Err(CommonError::InvalidGrid(
                "longitude axis must increase".to_string(),
            ));
        }

        let dy = dy.abs();
        let north_center = lats.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            width: lons.len(),
            height: lats.len(),
            origin_lon: lons[0] - dx / 2.0,
            origin_lat: north_center + dy / 2.0,
            dx,
            dy,
        })
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// ModelPixelScaleTag values.
    pub fn pixel_scale(&self) -> [f64; 3] {
        [self.dx, self.dy, 0.0]
    }

    /// ModelTiepointTag values: raster (0, 0) anchored at the top-left corner.
    pub fn tiepoint(&self) -> [f64; 6] {
        [0.0, 0.0, 0.0, self.origin_lon, self.origin_lat, 0.0]
    }
}

/// Whether a latitude axis is stored south-first.
pub fn latitudes_ascending(lats: &[f64]) -> bool {
    lats.len() > 1 && lats[1] > lats[0]
}

fn regular_step(axis: &[f64], name: &str) -> CommonResult<f64> {
    if axis.len() < 2 {
        return Err(CommonError::InvalidGrid(format!(
            "{} axis needs at least two points, got {}",
            name,
            axis.len()
        )));
    }
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(CommonError::InvalidGrid(format!(
            "{} axis contains non-finite values",
            name
        )));
    }

    let step = axis[1] - axis[0];
    if step == 0.0 {
        return Err(CommonError::InvalidGrid(format!("{} axis has zero spacing", name)));
    }

    let irregular = axis
        .windows(2)
        .any(|w| ((w[1] - w[0]) - step).abs() > step.abs() * SPACING_TOLERANCE);
    if irregular {
        return Err(CommonError::InvalidGrid(format!("{} axis is not regular", name)));
    }

    Ok(step)
}
