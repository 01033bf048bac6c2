use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::db::entities::tenant;
use crate::db::services;
use crate::web::models::residency_models::{ResidencyRecordRequest, ResidencyRecordView};
use crate::web::models::tenant_models::{CreateTenantRequest, TenantDetail, TenantListQuery, UpdateTenantRequest};
use crate::web::{AppError, AppState};

pub fn create_tenants_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tenants_handler).post(create_tenant_handler))
        .route(
            "/{id}",
            get(get_tenant_handler)
                .put(update_tenant_handler)
                .delete(delete_tenant_handler),
        )
        .route(
            "/{id}/residency-records",
            get(list_residency_records_handler).post(create_residency_record_handler),
        )
}

async fn list_tenants_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<TenantListQuery>,
) -> Result<Json<Vec<tenant::Model>>, AppError> {
    Ok(Json(services::list_tenants(&app_state.db_pool, &query).await?))
}

async fn get_tenant_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tenant_id): Path<i32>,
) -> Result<Json<TenantDetail>, AppError> {
    let settings = app_state.lifecycle();
    Ok(Json(
        services::get_tenant_detail(&app_state.db_pool, tenant_id, &settings).await?,
    ))
}

async fn create_tenant_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<tenant::Model>), AppError> {
    let created = services::create_tenant(&app_state.db_pool, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_tenant_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tenant_id): Path<i32>,
    Json(payload): Json<UpdateTenantRequest>,
) -> Result<Json<tenant::Model>, AppError> {
    Ok(Json(services::update_tenant(&app_state.db_pool, tenant_id, payload).await?))
}

async fn delete_tenant_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tenant_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::delete_tenant(&app_state.db_pool, tenant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_residency_records_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tenant_id): Path<i32>,
) -> Result<Json<Vec<ResidencyRecordView>>, AppError> {
    services::get_tenant(&app_state.db_pool, tenant_id).await?;
    let today = app_state.lifecycle().today;
    Ok(Json(
        services::list_residency_records(&app_state.db_pool, tenant_id, today).await?,
    ))
}

async fn create_residency_record_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tenant_id): Path<i32>,
    Json(payload): Json<ResidencyRecordRequest>,
) -> Result<(StatusCode, Json<ResidencyRecordView>), AppError> {
    let today = app_state.lifecycle().today;
    let created = services::create_residency_record(&app_state.db_pool, tenant_id, payload, today).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
