use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::enums::BillStatus;
use crate::web::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    pub contract_id: i32,
    pub month: i32,
    pub year: i32,
    /// Defaults to the room's base price.
    pub rent_amount: Option<i64>,
    #[serde(default)]
    pub electric_amount: i64,
    #[serde(default)]
    pub water_amount: i64,
    #[serde(default)]
    pub service_amount: i64,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBillRequest {
    pub rent_amount: Option<i64>,
    pub electric_amount: Option<i64>,
    pub water_amount: Option<i64>,
    pub service_amount: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayBillRequest {
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillListQuery {
    pub contract_id: Option<i32>,
    pub room_id: Option<i32>,
    pub status: Option<BillStatus>,
    pub month: Option<i32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillAmounts {
    pub rent: i64,
    pub electric: i64,
    pub water: i64,
    pub service: i64,
}

impl BillAmounts {
    pub fn validate(&self) -> Result<i64, AppError> {
        let parts = [
            ("rent", self.rent),
            ("electric", self.electric),
            ("water", self.water),
            ("service", self.service),
        ];
        if let Some((name, _)) = parts.iter().find(|(_, v)| *v < 0) {
            return Err(AppError::InvalidInput(format!("The {name} amount must not be negative.")));
        }
        parts
            .iter()
            .try_fold(0i64, |acc, (_, v)| acc.checked_add(*v))
            .ok_or_else(|| AppError::InvalidInput("Bill total is too large.".to_string()))
    }
}

pub fn validate_period(month: i32, year: i32) -> Result<(), AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::InvalidInput(format!("Month {month} is outside 1-12.")));
    }
    if !(2000..=2100).contains(&year) {
        return Err(AppError::InvalidInput(format!("Year {year} is out of range.")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_parts() {
        let amounts = BillAmounts {
            rent: 3_000_000,
            electric: 350_000,
            water: 100_000,
            service: 150_000,
        };
        assert_eq!(amounts.validate().unwrap(), 3_600_000);
    }

    #[test]
    fn negative_parts_are_rejected() {
        let amounts = BillAmounts {
            rent: 3_000_000,
            electric: -1,
            water: 0,
            service: 0,
        };
        let err = amounts.validate().unwrap_err();
        assert!(err.to_string().contains("electric"));
    }

    #[test]
    fn period_bounds() {
        assert!(validate_period(1, 2024).is_ok());
        assert!(validate_period(12, 2024).is_ok());
        assert!(validate_period(0, 2024).is_err());
        assert!(validate_period(13, 2024).is_err());
        assert!(validate_period(5, 1999).is_err());
    }
}
