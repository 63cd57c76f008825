//! Month completion check.
//!
//! A month counts as materialized once enough of its daily rasters exist.
//! The file system is the only record; there is no manifest.

use std::io::ErrorKind;

use tmax_common::YearMonth;
use tracing::{debug, info};

use crate::layout::OutputLayout;

/// Rasters a month needs before it is considered done.
///
/// Fixed for every month, so a 28-day February with all days present but
/// fewer than this many files is not complete.
pub const MIN_EXPECTED_DAYS: usize = 25;

/// Count `tmax_<YYYYMM>*.tif` files in the daily directory.
pub fn count_month_rasters(layout: &OutputLayout, month: YearMonth) -> std::io::Result<usize> {
    let entries = match std::fs::read_dir(layout.daily_dir()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let prefix = month.file_prefix();
    let mut count = 0;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with(&prefix) && name.ends_with(".tif") {
            count += 1;
        }
    }

    Ok(count)
}

/// Raster count for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCompletion {
    pub existing: usize,
}

impl MonthCompletion {
    pub fn is_complete(&self) -> bool {
        self.existing >= MIN_EXPECTED_DAYS
    }
}

/// Count a month's rasters, logging when the month is already done.
pub fn check_month(layout: &OutputLayout, month: YearMonth) -> std::io::Result<MonthCompletion> {
    let completion = MonthCompletion {
        existing: count_month_rasters(layout, month)?,
    };
    let existing = completion.existing;

    if completion.is_complete() {
        info!(
            year = month.year(),
            month = month.month(),
            existing,
            "Month {} already complete ({} files)",
            month,
            existing
        );
    } else {
        debug!(year = month.year(), month = month.month(), existing, "Month incomplete");
    }

    Ok(completion)
}

/// Whether the month already has at least [`MIN_EXPECTED_DAYS`] rasters.
pub fn is_month_complete(layout: &OutputLayout, month: YearMonth) -> std::io::Result<bool> {
    Ok(check_month(layout, month)?.is_complete())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch_days(layout: &OutputLayout, year: i32, month: u32, days: u32) {
        fs::create_dir_all(layout.daily_dir()).unwrap();
        for day in 1..=days {
            let path = layout
                .daily_dir()
                .join(format!("tmax_{}{:02}{:02}.tif", year, month, day));
            fs::write(path, b"").unwrap();
        }
    }

    #[test]
    fn test_missing_directory_counts_zero() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let month = YearMonth::new(2023, 6).unwrap();

        assert_eq!(count_month_rasters(&layout, month).unwrap(), 0);
        assert!(!is_month_complete(&layout, month).unwrap());
    }

    #[test]
    fn test_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let june = YearMonth::new(2023, 6).unwrap();

        touch_days(&layout, 2023, 6, 24);
        assert!(!is_month_complete(&layout, june).unwrap());

        touch_days(&layout, 2023, 6, 25);
        assert!(is_month_complete(&layout, june).unwrap());
    }

    #[test]
    fn test_only_matching_files_counted() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let june = YearMonth::new(2023, 6).unwrap();

        touch_days(&layout, 2023, 6, 10);
        touch_days(&layout, 2023, 7, 31);
        fs::write(layout.daily_dir().join("tmax_20230611.tif.partial"), b"").unwrap();
        fs::write(layout.daily_dir().join("tmax_20230612.nc"), b"").unwrap();
        fs::create_dir(layout.daily_dir().join("tmax_20230613.tif")).unwrap();

        assert_eq!(count_month_rasters(&layout, june).unwrap(), 10);
    }

    #[test]
    fn test_february_needs_threshold_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let feb = YearMonth::new(2023, 2).unwrap();

        touch_days(&layout, 2023, 2, 24);
        assert!(!is_month_complete(&layout, feb).unwrap());

        touch_days(&layout, 2023, 2, 28);
        assert!(is_month_complete(&layout, feb).unwrap());
    }
}
