//! Common types shared by the ERA5 Tmax crates.

pub mod area;
pub mod crs;
pub mod error;
pub mod grid;
pub mod month;

pub use area::Area;
pub use crs::CrsCode;
pub use error::{CommonError, CommonResult};
pub use grid::GeoGrid;
pub use month::{MonthRange, YearMonth};
