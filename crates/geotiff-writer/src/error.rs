//! Error types for GeoTIFF encoding.

use thiserror::Error;

/// Result type for GeoTIFF operations.
pub type GeoTiffResult<T> = Result<T, GeoTiffError>;

#[derive(Error, Debug)]
pub enum GeoTiffError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF codec error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Data length {got} does not match {width}x{height} grid")]
    ShapeMismatch {
        width: usize,
        height: usize,
        got: usize,
    },

    #[error("Grid dimensions {width}x{height} exceed TIFF limits")]
    TooLarge { width: usize, height: usize },

    #[error("Unsupported raster: {0}")]
    Unsupported(String),
}
