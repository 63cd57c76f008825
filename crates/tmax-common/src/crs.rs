//! Coordinate reference system declared on output rasters.

use std::fmt;

/// GeoTIFF key ids (GeoTIFF 1.0, section 6.2).
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const GEOG_ANGULAR_UNITS_GEO_KEY: u16 = 2054;

const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const ANGULAR_DEGREE: u16 = 9102;

/// Coordinate reference systems the rasters can be tagged with.
///
/// ERA5 grids are defined on geographic WGS84; the CRS is declared, never
/// inferred from the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    #[default]
    Epsg4326,
}

impl CrsCode {
    /// EPSG code of this CRS.
    pub fn epsg(&self) -> u16 {
        match self {
            CrsCode::Epsg4326 => 4326,
        }
    }

    /// GeoKeyDirectoryTag contents describing this CRS.
    ///
    /// Layout is a 4-short header followed by sorted 4-short key entries
    /// `(key id, tiff tag location, count, value)`.
    pub fn geo_key_directory(&self) -> Vec<u16> {
        let keys: [(u16, u16); 4] = [
            (GT_MODEL_TYPE_GEO_KEY, MODEL_TYPE_GEOGRAPHIC),
            (GT_RASTER_TYPE_GEO_KEY, RASTER_PIXEL_IS_AREA),
            (GEOGRAPHIC_TYPE_GEO_KEY, self.epsg()),
            (GEOG_ANGULAR_UNITS_GEO_KEY, ANGULAR_DEGREE),
        ];

        let mut directory = vec![1, 1, 0, keys.len() as u16];
        for (key, value) in keys {
            directory.extend_from_slice(&[key, 0, 1, value]);
        }
        directory
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}
