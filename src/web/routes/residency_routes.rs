use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::put,
    Json, Router,
};
use std::sync::Arc;

use crate::db::services;
use crate::web::models::residency_models::{ResidencyRecordRequest, ResidencyRecordView};
use crate::web::{AppError, AppState};

// Creation and listing hang off /api/tenants/{id}/residency-records.
pub fn create_residency_router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/{id}",
        put(update_residency_record_handler).delete(delete_residency_record_handler),
    )
}

async fn update_residency_record_handler(
    State(app_state): State<Arc<AppState>>,
    Path(record_id): Path<i32>,
    Json(payload): Json<ResidencyRecordRequest>,
) -> Result<Json<ResidencyRecordView>, AppError> {
    let today = app_state.lifecycle().today;
    Ok(Json(
        services::update_residency_record(&app_state.db_pool, record_id, payload, today).await?,
    ))
}

async fn delete_residency_record_handler(
    State(app_state): State<Arc<AppState>>,
    Path(record_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::delete_residency_record(&app_state.db_pool, record_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
