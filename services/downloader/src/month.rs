//! Per-month retrieve, convert and clean up.
//!
//! ```text
//! NOT_STARTED -> complete? -> DONE
//!             -> REQUESTING -> fail -> FAILED
//!             -> CONVERTING -> fail -> FAILED
//!             -> DONE
//! ```
//!
//! The bundle is removed on every path that may have created it.

use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;
use tmax_common::{Area, YearMonth};
use tracing::{error, info, instrument, warn};

use crate::cds::{ArchiveClient, ArchiveError};
use crate::completeness::check_month;
use crate::convert::{convert_bundle, ConvertError};
use crate::layout::OutputLayout;
use crate::request::RetrievalRequest;

/// What a successful month invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthOutcome {
    /// Enough rasters already existed; the archive was not contacted
    AlreadyComplete { existing: usize },
    /// The month was retrieved and converted
    Materialized { written: usize, skipped: usize },
}

/// The stage at which a month failed.
#[derive(Error, Debug)]
pub enum MonthError {
    #[error("Download failed: {0}")]
    Retrieval(#[source] ArchiveError),

    #[error("Conversion failed: {0}")]
    Conversion(#[source] ConvertError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MonthResult = Result<MonthOutcome, MonthError>;

/// Ensures one month of rasters exists.
pub struct MonthFetcher<A> {
    archive: A,
    layout: OutputLayout,
    area: Area,
    dataset: String,
}

impl<A: ArchiveClient> MonthFetcher<A> {
    pub fn new(archive: A, layout: OutputLayout, area: Area, dataset: impl Into<String>) -> Self {
        Self {
            archive,
            layout,
            area,
            dataset: dataset.into(),
        }
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    #[instrument(skip_all, fields(year = month.year(), month = month.month()))]
    pub async fn fetch(&self, month: YearMonth) -> MonthResult {
        let completion = check_month(&self.layout, month)?;
        if completion.is_complete() {
            return Ok(MonthOutcome::AlreadyComplete {
                existing: completion.existing,
            });
        }

        std::fs::create_dir_all(self.layout.temp_dir())?;
        std::fs::create_dir_all(self.layout.daily_dir())?;

        let bundle = self.layout.bundle_path(month);
        let request = RetrievalRequest::daily_maximum(month, self.area);

        info!("Starting download for {}", month);
        if let Err(e) = self.archive.retrieve(&self.dataset, &request, &bundle).await {
            error!(error = %e, "Download failed for {}", month);
            remove_bundle(&bundle);
            return Err(MonthError::Retrieval(e));
        }
        info!(path = %bundle.display(), "Download completed for {}", month);

        let converted = convert_bundle(&bundle, month, &self.layout);
        remove_bundle(&bundle);

        match converted {
            Ok(report) => Ok(MonthOutcome::Materialized {
                written: report.written,
                skipped: report.skipped,
            }),
            Err(e) => {
                error!(error = %e, "Conversion failed for {}", month);
                Err(MonthError::Conversion(e))
            }
        }
    }
}

fn remove_bundle(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove bundle"),
    }
}
