use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::entities::residency_record;
use crate::db::enums::ResidencyType;
use crate::web::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidencyRecordRequest {
    pub record_type: ResidencyType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ResidencyRecordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.end_date {
            Some(end) if end < self.start_date => Err(AppError::InvalidInput(format!(
                "End date {end} is before start date {}.",
                self.start_date
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidencyRecordView {
    #[serde(flatten)]
    pub record: residency_record::Model,
    pub active: bool,
}

/// Whether a record covers `today`; an absent end date never closes.
pub fn is_record_active(start_date: NaiveDate, end_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    start_date <= today && end_date.map_or(true, |end| today <= end)
}

impl ResidencyRecordView {
    pub fn new(record: residency_record::Model, today: NaiveDate) -> Self {
        let active = is_record_active(record.start_date, record.end_date, today);
        Self { record, active }
    }
}
