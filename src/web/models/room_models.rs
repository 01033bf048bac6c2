use serde::Deserialize;

use crate::db::enums::RoomStatus;
use crate::web::error::AppError;

/// Upper bound for a monthly base price, far above any real rent.
pub const MAX_BASE_PRICE: i64 = 1_000_000_000_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub number: String,
    pub floor: i32,
    pub area: f64,
    pub capacity: i32,
    pub base_price: i64,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomRequest {
    pub number: Option<String>,
    pub floor: Option<i32>,
    pub area: Option<f64>,
    pub capacity: Option<i32>,
    pub base_price: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoomStatusRequest {
    pub status: RoomStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct RoomListQuery {
    pub status: Option<RoomStatus>,
    pub floor: Option<i32>,
}

pub fn validate_room_fields(
    number: &str,
    area: f64,
    capacity: i32,
    base_price: i64,
) -> Result<(), AppError> {
    if number.trim().is_empty() {
        return Err(AppError::InvalidInput("Room number is required.".to_string()));
    }
    if !area.is_finite() || area <= 0.0 {
        return Err(AppError::InvalidInput("Room area must be greater than 0.".to_string()));
    }
    if capacity < 1 {
        return Err(AppError::InvalidInput("Room capacity must be at least 1.".to_string()));
    }
    if base_price < 0 {
        return Err(AppError::InvalidInput("Base price must not be negative.".to_string()));
    }
    if base_price > MAX_BASE_PRICE {
        return Err(AppError::InvalidInput(format!("Base price must not exceed {MAX_BASE_PRICE}.")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_validation() {
        assert!(validate_room_fields("101", 18.5, 2, 3_000_000).is_ok());
        assert!(validate_room_fields("  ", 18.5, 2, 3_000_000).is_err());
        assert!(validate_room_fields("101", 0.0, 2, 3_000_000).is_err());
        assert!(validate_room_fields("101", f64::NAN, 2, 3_000_000).is_err());
        assert!(validate_room_fields("101", 18.5, 0, 3_000_000).is_err());
        assert!(validate_room_fields("101", 18.5, 2, -1).is_err());
        assert!(validate_room_fields("101", 18.5, 2, MAX_BASE_PRICE).is_ok());
        assert!(validate_room_fields("101", 18.5, 2, i64::MAX / 10).is_err());
    }
}
