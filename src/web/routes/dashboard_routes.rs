use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use crate::db::services::{self, DashboardStats};
use crate::web::{AppError, AppState};

pub fn create_dashboard_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(dashboard_handler))
}

async fn dashboard_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<DashboardStats>, AppError> {
    let settings = app_state.lifecycle();
    Ok(Json(services::get_dashboard(&app_state.db_pool, &settings).await?))
}
