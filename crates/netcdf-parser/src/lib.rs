//! NetCDF reader for ERA5 daily-statistics bundles.
//!
//! A retrieval from the archive yields one NetCDF file holding a whole
//! month of daily fields. This crate decodes such a file into a
//! [`DailyBundle`]: calendar dates from the CF time axis, a north-up
//! [`GeoGrid`](tmax_common::GeoGrid) from the coordinate axes, and unpacked
//! per-day slices.
//!
//! # Implementation Notes
//!
//! Reading goes through the `netcdf` crate (libnetcdf + HDF5).
//! System requirements: libhdf5-dev libnetcdf-dev.

pub mod bundle;
pub mod cf_time;
pub mod error;
pub mod native;

pub use bundle::DailyBundle;
pub use cf_time::{CfTimeUnits, TimeUnit};
pub use error::{NetCdfError, NetCdfResult};
pub use native::silence_hdf5_errors;
