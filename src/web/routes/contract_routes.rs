use axum::{
    body::Bytes,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::db::services;
use crate::web::models::contract_models::{
    CheckOutRequest, ContractListQuery, ContractView, CreateContractRequest, DeleteContractQuery,
    ExtendContractRequest, ReplaceTenantsRequest, UpdateContractRequest, UpdateContractStatusRequest,
};
use crate::web::models::AuthenticatedUser;
use crate::web::{AppError, AppState};

pub fn create_contracts_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_contracts_handler).post(create_contract_handler))
        .route(
            "/{id}",
            get(get_contract_handler)
                .put(update_contract_handler)
                .delete(delete_contract_handler),
        )
        .route("/{id}/tenants", put(replace_tenants_handler))
        .route("/{id}/extend", post(extend_contract_handler))
        .route("/{id}/checkin", post(check_in_handler))
        .route("/{id}/checkout", post(check_out_handler))
        .route("/{id}/status", patch(update_status_handler))
}

async fn list_contracts_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ContractListQuery>,
) -> Result<Json<Vec<ContractView>>, AppError> {
    let settings = app_state.lifecycle();
    Ok(Json(
        services::list_contracts(&app_state.db_pool, &query, &settings).await?,
    ))
}

async fn get_contract_handler(
    State(app_state): State<Arc<AppState>>,
    Path(contract_id): Path<i32>,
) -> Result<Json<ContractView>, AppError> {
    let settings = app_state.lifecycle();
    Ok(Json(
        services::get_contract_view(&app_state.db_pool, contract_id, &settings).await?,
    ))
}

async fn create_contract_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateContractRequest>,
) -> Result<(StatusCode, Json<ContractView>), AppError> {
    let settings = app_state.lifecycle();
    let created = services::create_contract(&app_state.db_pool, payload, &settings).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_contract_handler(
    State(app_state): State<Arc<AppState>>,
    Path(contract_id): Path<i32>,
    Json(payload): Json<UpdateContractRequest>,
) -> Result<Json<ContractView>, AppError> {
    let settings = app_state.lifecycle();
    Ok(Json(
        services::update_contract(&app_state.db_pool, contract_id, payload, &settings).await?,
    ))
}

async fn replace_tenants_handler(
    State(app_state): State<Arc<AppState>>,
    Path(contract_id): Path<i32>,
    Json(payload): Json<ReplaceTenantsRequest>,
) -> Result<Json<ContractView>, AppError> {
    let settings = app_state.lifecycle();
    Ok(Json(
        services::replace_tenants(&app_state.db_pool, contract_id, payload, &settings).await?,
    ))
}

async fn extend_contract_handler(
    State(app_state): State<Arc<AppState>>,
    Path(contract_id): Path<i32>,
    Json(payload): Json<ExtendContractRequest>,
) -> Result<Json<ContractView>, AppError> {
    let settings = app_state.lifecycle();
    Ok(Json(
        services::extend_contract(&app_state.db_pool, contract_id, payload.end_date, &settings).await?,
    ))
}

async fn check_in_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(contract_id): Path<i32>,
) -> Result<Json<ContractView>, AppError> {
    let settings = app_state.lifecycle();
    let view = services::check_in(&app_state.db_pool, contract_id, &settings).await?;
    info!(contract_id, user_id = user.id, "Check-in recorded.");
    Ok(Json(view))
}

async fn check_out_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(contract_id): Path<i32>,
    body: Bytes,
) -> Result<Json<ContractView>, AppError> {
    let settings = app_state.lifecycle();
    // The body is optional; an empty request checks out without a reason.
    let reason = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<CheckOutRequest>(&body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid check-out body: {e}")))?
            .reason
    };
    let view = services::check_out(&app_state.db_pool, contract_id, reason, &settings).await?;
    info!(contract_id, user_id = user.id, "Check-out recorded.");
    Ok(Json(view))
}

async fn update_status_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(contract_id): Path<i32>,
    Json(payload): Json<UpdateContractStatusRequest>,
) -> Result<Json<ContractView>, AppError> {
    let settings = app_state.lifecycle();
    let view = services::change_status(
        &app_state.db_pool,
        contract_id,
        &payload.status,
        payload.reason,
        &settings,
    )
    .await?;
    info!(contract_id, user_id = user.id, status = %payload.status, "Contract status changed by user.");
    Ok(Json(view))
}

async fn delete_contract_handler(
    State(app_state): State<Arc<AppState>>,
    Path(contract_id): Path<i32>,
    Query(query): Query<DeleteContractQuery>,
) -> Result<StatusCode, AppError> {
    services::delete_contract(&app_state.db_pool, contract_id, query.confirm.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
