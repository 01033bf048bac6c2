use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::entities::contract;
use crate::db::enums::ContractStatus;
use crate::lifecycle::{ContractBadge, ContractTimeline};
use crate::web::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    pub contract_number: Option<String>,
    pub room_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub deposit: i64,
    pub tenant_ids: Vec<i32>,
    /// Defaults to the first entry of `tenant_ids`.
    pub primary_tenant_id: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContractRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub deposit: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceTenantsRequest {
    pub tenant_ids: Vec<i32>,
    pub primary_tenant_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendContractRequest {
    pub end_date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckOutRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContractStatusRequest {
    pub status: String,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractListQuery {
    pub status: Option<ContractStatus>,
    pub room_id: Option<i32>,
    pub tenant_id: Option<i32>,
    pub badge: Option<ContractBadge>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteContractQuery {
    /// Must repeat the contract number when unpaid bills would be lost.
    pub confirm: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTenantView {
    pub tenant_id: i32,
    pub full_name: String,
    pub phone: Option<String>,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractView {
    #[serde(flatten)]
    pub contract: contract::Model,
    pub room_number: Option<String>,
    pub tenants: Vec<ContractTenantView>,
    #[serde(flatten)]
    pub timeline: ContractTimeline,
}

pub fn validate_contract_terms(start_date: NaiveDate, end_date: NaiveDate, deposit: i64) -> Result<(), AppError> {
    if end_date <= start_date {
        return Err(AppError::InvalidInput(format!(
            "End date {end_date} must be after start date {start_date}."
        )));
    }
    if deposit <= 0 {
        return Err(AppError::InvalidInput("Deposit must be greater than 0.".to_string()));
    }
    Ok(())
}

/// Deduplicates the tenant list and settles the primary tenant. Exactly
/// one primary is returned, and it is always part of the list.
pub fn normalize_tenant_selection(
    tenant_ids: &[i32],
    primary_tenant_id: Option<i32>,
) -> Result<(Vec<i32>, i32), AppError> {
    let mut ids: Vec<i32> = Vec::with_capacity(tenant_ids.len());
    for id in tenant_ids {
        if !ids.contains(id) {
            ids.push(*id);
        }
    }
    let Some(first) = ids.first().copied() else {
        return Err(AppError::InvalidInput("A contract needs at least one tenant.".to_string()));
    };
    let primary = primary_tenant_id.unwrap_or(first);
    if !ids.contains(&primary) {
        return Err(AppError::InvalidInput(format!(
            "Primary tenant {primary} is not one of the contract's tenants."
        )));
    }
    Ok((ids, primary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn terms_require_ordered_dates_and_positive_deposit() {
        assert!(validate_contract_terms(d(2024, 1, 1), d(2024, 1, 31), 1_000_000).is_ok());
        assert!(validate_contract_terms(d(2024, 1, 31), d(2024, 1, 31), 1_000_000).is_err());
        assert!(validate_contract_terms(d(2024, 2, 1), d(2024, 1, 31), 1_000_000).is_err());
        assert!(validate_contract_terms(d(2024, 1, 1), d(2024, 1, 31), 0).is_err());
        assert!(validate_contract_terms(d(2024, 1, 1), d(2024, 1, 31), -5).is_err());
    }

    #[test]
    fn primary_defaults_to_first_tenant() {
        let (ids, primary) = normalize_tenant_selection(&[7, 3, 7], None).unwrap();
        assert_eq!(ids, vec![7, 3]);
        assert_eq!(primary, 7);
    }

    #[test]
    fn primary_must_belong_to_contract() {
        assert!(normalize_tenant_selection(&[1, 2], Some(3)).is_err());
        assert_eq!(normalize_tenant_selection(&[1, 2], Some(2)).unwrap().1, 2);
        assert!(normalize_tenant_selection(&[], None).is_err());
    }
}
