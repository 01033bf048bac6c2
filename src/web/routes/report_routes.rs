use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::info;

use crate::db::services;
use crate::reports::export::SheetRow;
use crate::reports::{
    export_file_name, export_pdf, export_xlsx, BillRow, ExportFormat, OccupancyRow, Report, ReportKind, RevenueRow,
};
use crate::web::models::report_models::{ExportQuery, ReportQuery};
use crate::web::{AppError, AppState};

// `roomIds` repeats in the query string, so these use the axum-extra Query.
pub fn create_reports_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/revenue", get(revenue_report_handler))
        .route("/occupancy", get(occupancy_report_handler))
        .route("/bills", get(bill_report_handler))
        .route("/export", get(export_report_handler))
}

async fn revenue_report_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report<RevenueRow>>, AppError> {
    let range = query.range()?;
    Ok(Json(services::build_revenue_report(&app_state.db_pool, &range).await?))
}

async fn occupancy_report_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report<OccupancyRow>>, AppError> {
    let range = query.range()?;
    Ok(Json(services::build_occupancy_report(&app_state.db_pool, &range).await?))
}

async fn bill_report_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report<BillRow>>, AppError> {
    let range = query.range()?;
    Ok(Json(services::build_bill_report(&app_state.db_pool, &range).await?))
}

fn file_response<T: SheetRow>(kind: ReportKind, format: ExportFormat, report: &Report<T>) -> Result<Response, AppError> {
    let bytes = match format {
        ExportFormat::Excel => {
            export_xlsx(report).map_err(|e| AppError::InternalServerError(format!("Failed to build workbook: {e}")))?
        }
        ExportFormat::Pdf => {
            export_pdf(report).map_err(|e| AppError::InternalServerError(format!("Failed to build PDF: {e}")))?
        }
    };
    let file_name = export_file_name(kind.as_str(), &report.summary, format);
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|e| AppError::InternalServerError(format!("Invalid file name header: {e}")))?;

    info!(report = kind.as_str(), file = %file_name, size = bytes.len(), "Report exported.");
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(format.content_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn export_report_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let range = query.range()?;
    let db = &app_state.db_pool;
    let (kind, format) = (query.kind, query.format);
    match kind {
        ReportKind::Revenue => file_response(kind, format, &services::build_revenue_report(db, &range).await?),
        ReportKind::Occupancy => file_response(kind, format, &services::build_occupancy_report(db, &range).await?),
        ReportKind::Bills => file_response(kind, format, &services::build_bill_report(db, &range).await?),
    }
}
