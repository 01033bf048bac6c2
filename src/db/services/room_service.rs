use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use crate::db::entities::{contract, room};
use crate::db::enums::RoomStatus;
use crate::db::services::contract_service::active_contract_for_room;
use crate::web::error::AppError;
use crate::web::models::room_models::{validate_room_fields, CreateRoomRequest, RoomListQuery, UpdateRoomRequest};

// --- Room Service Functions ---

pub async fn get_room(db: &DatabaseConnection, room_id: i32) -> Result<room::Model, AppError> {
    room::Entity::find_by_id(room_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Room {room_id} not found")))
}

pub async fn list_rooms(db: &DatabaseConnection, query: &RoomListQuery) -> Result<Vec<room::Model>, AppError> {
    let mut select = room::Entity::find()
        .order_by_asc(room::Column::Floor)
        .order_by_asc(room::Column::Number);
    if let Some(status) = query.status {
        select = select.filter(room::Column::Status.eq(status));
    }
    if let Some(floor) = query.floor {
        select = select.filter(room::Column::Floor.eq(floor));
    }
    Ok(select.all(db).await?)
}

async fn ensure_number_free(db: &DatabaseConnection, number: &str, except_id: Option<i32>) -> Result<(), AppError> {
    let mut select = room::Entity::find().filter(room::Column::Number.eq(number));
    if let Some(id) = except_id {
        select = select.filter(room::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(AppError::Conflict(format!("Room number {number} already exists")));
    }
    Ok(())
}

pub async fn create_room(db: &DatabaseConnection, req: CreateRoomRequest) -> Result<room::Model, AppError> {
    let number = req.number.trim().to_string();
    validate_room_fields(&number, req.area, req.capacity, req.base_price)?;
    ensure_number_free(db, &number, None).await?;

    let now = Utc::now();
    let created = room::ActiveModel {
        number: Set(number),
        floor: Set(req.floor),
        area: Set(req.area),
        capacity: Set(req.capacity),
        base_price: Set(req.base_price),
        status: Set(RoomStatus::Available),
        description: Set(req.description),
        version: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(room_id = created.id, number = %created.number, "Room created.");
    Ok(created)
}

pub async fn update_room(
    db: &DatabaseConnection,
    room_id: i32,
    req: UpdateRoomRequest,
) -> Result<room::Model, AppError> {
    let existing = get_room(db, room_id).await?;

    let number = req.number.map(|n| n.trim().to_string()).unwrap_or_else(|| existing.number.clone());
    let area = req.area.unwrap_or(existing.area);
    let capacity = req.capacity.unwrap_or(existing.capacity);
    let base_price = req.base_price.unwrap_or(existing.base_price);
    validate_room_fields(&number, area, capacity, base_price)?;
    if number != existing.number {
        ensure_number_free(db, &number, Some(room_id)).await?;
    }

    let floor = req.floor.unwrap_or(existing.floor);
    let description = req.description.or_else(|| existing.description.clone());
    let version = existing.version;

    let mut active = existing.into_active_model();
    active.number = Set(number);
    active.floor = Set(floor);
    active.area = Set(area);
    active.capacity = Set(capacity);
    active.base_price = Set(base_price);
    active.description = Set(description);
    active.version = Set(version + 1);
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

/// Manual status changes. OCCUPIED is reserved for check-in, and a room
/// held by an ACTIVE contract keeps its status until check-out.
pub async fn update_room_status(
    db: &DatabaseConnection,
    room_id: i32,
    status: RoomStatus,
) -> Result<room::Model, AppError> {
    if status == RoomStatus::Occupied {
        return Err(AppError::InvalidInput(
            "Rooms become occupied through contract check-in.".to_string(),
        ));
    }
    let existing = get_room(db, room_id).await?;
    if let Some(active) = active_contract_for_room(db, room_id).await? {
        return Err(AppError::Conflict(format!(
            "Room {} is held by active contract {}",
            existing.number, active.contract_number
        )));
    }

    let result = room::Entity::update_many()
        .set(room::ActiveModel {
            status: Set(status),
            version: Set(existing.version + 1),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(room::Column::Id.eq(room_id))
        .filter(room::Column::Version.eq(existing.version))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "Room {} was modified by another request; reload and try again",
            existing.number
        )));
    }

    info!(room_id, from = %existing.status, to = %status, "Room status changed.");
    get_room(db, room_id).await
}

pub async fn delete_room(db: &DatabaseConnection, room_id: i32) -> Result<(), AppError> {
    let existing = get_room(db, room_id).await?;
    let contracts = contract::Entity::find()
        .filter(contract::Column::RoomId.eq(room_id))
        .count(db)
        .await?;
    if contracts > 0 {
        return Err(AppError::Conflict(format!(
            "Room {} has {contracts} contract(s) and cannot be deleted",
            existing.number
        )));
    }
    room::Entity::delete_by_id(room_id).exec(db).await?;
    info!(room_id, number = %existing.number, "Room deleted.");
    Ok(())
}
