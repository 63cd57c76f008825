//! Error types for the common value types.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Validation errors raised while building the shared value types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommonError {
    #[error("Invalid month {month} for year {year}: expected 1-12")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Invalid area [{north}, {west}, {south}, {east}]: {message}")]
    InvalidArea {
        north: f64,
        west: f64,
        south: f64,
        east: f64,
        message: String,
    },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),
}
