//! GeoTIFF output for daily temperature grids.
//!
//! Each daily field becomes one single-band, 32-bit float GeoTIFF with
//! lossless compression and a declared CRS. Writes are atomic at the file
//! level: the raster appears under its final name only once complete.

pub mod encode;
pub mod error;
pub mod read;

pub use encode::{encode_geotiff, partial_path, write_geotiff, Compression, GeoTiffOptions};
pub use error::{GeoTiffError, GeoTiffResult};
pub use read::GeoTiffRaster;
