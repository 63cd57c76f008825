//! Retrieval requests for the daily-statistics dataset.

use serde::Serialize;
use tmax_common::{Area, YearMonth};

/// One month of daily maximum 2 m temperature over an area.
///
/// Serializes to the archive's `inputs` object. Days 01-31 are always
/// requested; the archive drops the ones a month does not have.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalRequest {
    pub product_type: String,
    pub variable: Vec<String>,
    pub year: String,
    pub month: String,
    pub day: Vec<String>,
    pub daily_statistic: String,
    pub time_zone: String,
    pub frequency: String,
    pub area: Area,
    pub data_format: String,
    #[serde(skip)]
    target: YearMonth,
}

impl RetrievalRequest {
    pub fn daily_maximum(month: YearMonth, area: Area) -> Self {
        Self {
            product_type: "reanalysis".to_string(),
            variable: vec!["2m_temperature".to_string()],
            year: month.year().to_string(),
            month: format!("{:02}", month.month()),
            day: (1..=31).map(|d| format!("{:02}", d)).collect(),
            daily_statistic: "daily_maximum".to_string(),
            time_zone: "utc+00:00".to_string(),
            frequency: "1_hourly".to_string(),
            area,
            data_format: "netcdf".to_string(),
            target: month,
        }
    }

    /// The month this request covers.
    pub fn target(&self) -> YearMonth {
        self.target
    }
}
