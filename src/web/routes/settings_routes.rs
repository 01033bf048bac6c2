use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::db::entities::setting;
use crate::db::services as db_services;
use crate::web::{AppError, AppState};

// Mounted under /api/settings
pub fn create_settings_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_settings_handler))
        .route("/{key}", get(get_setting_handler).put(update_setting_handler))
}

async fn list_settings_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<Vec<setting::Model>>, AppError> {
    let settings = db_services::list_settings(&app_state.db_pool).await?;
    Ok(Json(settings))
}

async fn get_setting_handler(
    State(app_state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    match db_services::get_setting(&app_state.db_pool, &key).await? {
        Some(s_model) => Ok(Json(s_model.value)),
        None => Err(AppError::NotFound(format!("Setting '{key}' not found."))),
    }
}

async fn update_setting_handler(
    State(app_state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    if key.trim().is_empty() {
        return Err(AppError::InvalidInput("Setting key must not be empty.".to_string()));
    }
    let saved = db_services::update_setting(&app_state.db_pool, &key, &payload).await?;
    Ok(Json(saved.value))
}
