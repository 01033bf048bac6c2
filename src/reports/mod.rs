//! Revenue, occupancy and bill reports over a date range.

pub mod aggregator;
pub mod export;

use serde::Deserialize;

pub use aggregator::{
    bill_report, occupancy_report, revenue_report, BillRow, OccupancyRow, Period, Report, ReportError, ReportInput,
    ReportRange, ReportSummary, RevenueRow,
};
pub use export::{export_file_name, export_pdf, export_xlsx, ExportFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Revenue,
    Occupancy,
    Bills,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Revenue => "revenue",
            ReportKind::Occupancy => "occupancy",
            ReportKind::Bills => "bills",
        }
    }
}
