use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::db::entities::bill;
use crate::db::services;
use crate::web::models::bill_models::{BillListQuery, CreateBillRequest, PayBillRequest, UpdateBillRequest};
use crate::web::{AppError, AppState};

pub fn create_bills_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_bills_handler).post(create_bill_handler))
        .route(
            "/{id}",
            get(get_bill_handler).put(update_bill_handler).delete(delete_bill_handler),
        )
        .route("/{id}/pay", post(pay_bill_handler))
}

async fn list_bills_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<BillListQuery>,
) -> Result<Json<Vec<bill::Model>>, AppError> {
    Ok(Json(services::list_bills(&app_state.db_pool, &query).await?))
}

async fn get_bill_handler(
    State(app_state): State<Arc<AppState>>,
    Path(bill_id): Path<i32>,
) -> Result<Json<bill::Model>, AppError> {
    Ok(Json(services::get_bill(&app_state.db_pool, bill_id).await?))
}

async fn create_bill_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<bill::Model>), AppError> {
    let settings = app_state.lifecycle();
    let created = services::create_bill(&app_state.db_pool, payload, settings.today, settings.bill_due_days).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_bill_handler(
    State(app_state): State<Arc<AppState>>,
    Path(bill_id): Path<i32>,
    Json(payload): Json<UpdateBillRequest>,
) -> Result<Json<bill::Model>, AppError> {
    Ok(Json(services::update_bill(&app_state.db_pool, bill_id, payload).await?))
}

async fn pay_bill_handler(
    State(app_state): State<Arc<AppState>>,
    Path(bill_id): Path<i32>,
    Json(payload): Json<PayBillRequest>,
) -> Result<Json<bill::Model>, AppError> {
    let today = app_state.lifecycle().today;
    Ok(Json(
        services::pay_bill(&app_state.db_pool, bill_id, payload.paid_date, today).await?,
    ))
}

async fn delete_bill_handler(
    State(app_state): State<Arc<AppState>>,
    Path(bill_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::delete_bill(&app_state.db_pool, bill_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
