//! On-disk layout under the configured base directory.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tmax_common::YearMonth;

pub const DAILY_DIR: &str = "Daily_Tmax_TIF";
pub const TEMP_DIR: &str = "temp";

/// Where rasters and transient bundles live.
///
/// ```text
/// <base>/Daily_Tmax_TIF/tmax_YYYYMMDD.tif
/// <base>/temp/temp_YYYY_MM.nc
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    base_dir: PathBuf,
    daily_dir: PathBuf,
    temp_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            daily_dir: base_dir.join(DAILY_DIR),
            temp_dir: base_dir.join(TEMP_DIR),
            base_dir,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn daily_dir(&self) -> &Path {
        &self.daily_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Create both directories.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.daily_dir)?;
        std::fs::create_dir_all(&self.temp_dir)
    }

    pub fn raster_path(&self, date: NaiveDate) -> PathBuf {
        self.daily_dir
            .join(format!("tmax_{}.tif", date.format("%Y%m%d")))
    }

    pub fn bundle_path(&self, month: YearMonth) -> PathBuf {
        self.temp_dir
            .join(format!("temp_{}_{:02}.nc", month.year(), month.month()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = OutputLayout::new("/data/ERA5_Tmax");
        let date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let month = YearMonth::new(2023, 6).unwrap();

        assert_eq!(
            layout.raster_path(date),
            PathBuf::from("/data/ERA5_Tmax/Daily_Tmax_TIF/tmax_20230601.tif")
        );
        assert_eq!(
            layout.bundle_path(month),
            PathBuf::from("/data/ERA5_Tmax/temp/temp_2023_06.nc")
        );
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("nested/base"));

        layout.ensure_dirs().unwrap();
        layout.ensure_dirs().unwrap();

        assert!(layout.daily_dir().is_dir());
        assert!(layout.temp_dir().is_dir());
    }
}
