//! Shared helpers for downloader integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tmax_common::{Area, YearMonth};
use tmax_downloader::{ArchiveClient, ArchiveError, MonthFetcher, OutputLayout, RetrievalRequest};
use test_utils::BundleFixture;
use tracing_subscriber::fmt::MakeWriter;

/// What the stub archive does for a month.
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// Deliver a bundle with days `1..=n` at a constant Kelvin value
    Days(u32, f32),
    /// Fail the retrieval after leaving a partial file behind
    Fail,
    /// Deliver bytes that are not NetCDF
    Garbage,
}

/// In-memory archive that writes synthetic bundles.
#[derive(Default)]
pub struct StubArchive {
    responses: HashMap<YearMonth, StubResponse>,
    calls: Mutex<Vec<YearMonth>>,
}

impl StubArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, month: YearMonth, response: StubResponse) -> Self {
        self.responses.insert(month, response);
        self
    }

    pub fn calls(&self) -> Vec<YearMonth> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArchiveClient for StubArchive {
    async fn retrieve(
        &self,
        _dataset: &str,
        request: &RetrievalRequest,
        target: &Path,
    ) -> Result<u64, ArchiveError> {
        let month = request.target();
        self.calls.lock().unwrap().push(month);

        match self.responses.get(&month) {
            Some(StubResponse::Days(days, kelvin)) => {
                BundleFixture::month(month.year(), month.month(), *days)
                    .constant(*kelvin)
                    .write(target)
                    .map_err(|e| ArchiveError::Protocol(e.to_string()))?;
                Ok(std::fs::metadata(target)?.len())
            }
            Some(StubResponse::Garbage) => {
                std::fs::write(target, b"<html>maintenance</html>")?;
                Ok(24)
            }
            Some(StubResponse::Fail) | None => {
                std::fs::write(target, b"CDF\x01partial")?;
                Err(ArchiveError::Rejected {
                    status: 500,
                    message: format!("no data for {}", month),
                })
            }
        }
    }
}

pub fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

pub fn fetcher(base: &Path, archive: StubArchive) -> MonthFetcher<StubArchive> {
    let layout = OutputLayout::new(base);
    layout.ensure_dirs().unwrap();
    MonthFetcher::new(
        archive,
        layout,
        Area::new(45.2, 10.0, 45.0, 10.3).unwrap(),
        "derived-era5-land-daily-statistics",
    )
}

/// Names of the rasters in the daily directory, sorted.
pub fn raster_names(layout: &OutputLayout) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(layout.daily_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn temp_is_empty(layout: &OutputLayout) -> bool {
    std::fs::read_dir(layout.temp_dir()).unwrap().next().is_none()
}

/// Log sink for `tracing_subscriber::fmt().with_writer(..)`.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
