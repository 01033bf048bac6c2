use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use std::sync::Arc;

use crate::db::entities::room;
use crate::db::services;
use crate::web::models::room_models::{CreateRoomRequest, RoomListQuery, UpdateRoomRequest, UpdateRoomStatusRequest};
use crate::web::{AppError, AppState};

pub fn create_rooms_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_rooms_handler).post(create_room_handler))
        .route(
            "/{id}",
            get(get_room_handler).put(update_room_handler).delete(delete_room_handler),
        )
        .route("/{id}/status", patch(update_room_status_handler))
}

async fn list_rooms_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<RoomListQuery>,
) -> Result<Json<Vec<room::Model>>, AppError> {
    let rooms = services::list_rooms(&app_state.db_pool, &query).await?;
    Ok(Json(rooms))
}

async fn get_room_handler(
    State(app_state): State<Arc<AppState>>,
    Path(room_id): Path<i32>,
) -> Result<Json<room::Model>, AppError> {
    Ok(Json(services::get_room(&app_state.db_pool, room_id).await?))
}

async fn create_room_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<room::Model>), AppError> {
    let created = services::create_room(&app_state.db_pool, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_room_handler(
    State(app_state): State<Arc<AppState>>,
    Path(room_id): Path<i32>,
    Json(payload): Json<UpdateRoomRequest>,
) -> Result<Json<room::Model>, AppError> {
    Ok(Json(services::update_room(&app_state.db_pool, room_id, payload).await?))
}

async fn update_room_status_handler(
    State(app_state): State<Arc<AppState>>,
    Path(room_id): Path<i32>,
    Json(payload): Json<UpdateRoomStatusRequest>,
) -> Result<Json<room::Model>, AppError> {
    Ok(Json(
        services::update_room_status(&app_state.db_pool, room_id, payload.status).await?,
    ))
}

async fn delete_room_handler(
    State(app_state): State<Arc<AppState>>,
    Path(room_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::delete_room(&app_state.db_pool, room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
