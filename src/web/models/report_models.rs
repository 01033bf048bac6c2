use chrono::NaiveDate;
use serde::Deserialize;

use crate::reports::{ExportFormat, ReportKind, ReportRange};
use crate::web::error::AppError;

/// `?startDate=2024-01-01&endDate=2024-03-31&roomIds=1&roomIds=2`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub room_ids: Vec<i32>,
}

impl ReportQuery {
    pub fn range(&self) -> Result<ReportRange, AppError> {
        ReportRange::new(self.start_date, self.end_date, self.room_ids.clone()).map_err(AppError::InvalidInput)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub format: ExportFormat,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub room_ids: Vec<i32>,
}

impl ExportQuery {
    pub fn range(&self) -> Result<ReportRange, AppError> {
        ReportRange::new(self.start_date, self.end_date, self.room_ids.clone()).map_err(AppError::InvalidInput)
    }
}
