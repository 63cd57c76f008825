//! Month range processing.

use std::time::Duration;

use tmax_common::{MonthRange, YearMonth};
use tracing::{error, info};

use crate::cds::ArchiveClient;
use crate::month::{MonthFetcher, MonthOutcome};

/// Aggregate result of a range run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodSummary {
    pub total: usize,
    pub successful: usize,
    /// Failed months with the reason
    pub failed: Vec<(YearMonth, String)>,
}

impl PeriodSummary {
    pub fn is_complete(&self) -> bool {
        self.successful == self.total
    }
}

/// Runs a [`MonthFetcher`] over every month of a range, one at a time.
pub struct PeriodRunner<A> {
    fetcher: MonthFetcher<A>,
    delay: Duration,
}

impl<A: ArchiveClient> PeriodRunner<A> {
    /// `delay` is slept after every month, whatever its outcome.
    pub fn new(fetcher: MonthFetcher<A>, delay: Duration) -> Self {
        Self { fetcher, delay }
    }

    pub fn fetcher(&self) -> &MonthFetcher<A> {
        &self.fetcher
    }

    /// Process every month in `range`. A failed month never stops the run.
    pub async fn run(&self, range: MonthRange) -> PeriodSummary {
        info!(
            start = %range.start,
            end = %range.end,
            "Starting download from {}/{:02} to {}/{:02}",
            range.start.year(),
            range.start.month(),
            range.end.year(),
            range.end.month()
        );

        let mut summary = PeriodSummary::default();

        for month in range {
            summary.total += 1;

            match self.fetcher.fetch(month).await {
                Ok(MonthOutcome::AlreadyComplete { .. }) => summary.successful += 1,
                Ok(MonthOutcome::Materialized { written, skipped }) => {
                    info!(
                        year = month.year(),
                        month = month.month(),
                        written,
                        skipped,
                        "Month {} materialized",
                        month
                    );
                    summary.successful += 1;
                }
                Err(e) => {
                    error!(year = month.year(), month = month.month(), error = %e, "Month {} failed", month);
                    summary.failed.push((month, e.to_string()));
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            successful = summary.successful,
            total = summary.total,
            "Download completed: {}/{} months successful",
            summary.successful,
            summary.total
        );

        summary
    }
}
