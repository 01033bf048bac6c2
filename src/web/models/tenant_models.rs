use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::entities::tenant;
use crate::web::error::AppError;
use crate::web::models::contract_models::ContractView;
use crate::web::models::residency_models::ResidencyRecordView;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantRequest {
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub id_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub hometown: Option<String>,
    pub occupation: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub id_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub hometown: Option<String>,
    pub occupation: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TenantListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDetail {
    #[serde(flatten)]
    pub tenant: tenant::Model,
    pub contracts: Vec<ContractView>,
    pub residency_records: Vec<ResidencyRecordView>,
}

pub fn validate_tenant_fields(full_name: &str, id_number: &str, email: Option<&str>) -> Result<(), AppError> {
    if full_name.trim().is_empty() {
        return Err(AppError::InvalidInput("Tenant name is required.".to_string()));
    }
    if id_number.trim().is_empty() {
        return Err(AppError::InvalidInput("Tenant ID number is required.".to_string()));
    }
    if let Some(email) = email.filter(|e| !e.is_empty()) {
        if !email.contains('@') {
            return Err(AppError::InvalidInput(format!("'{email}' is not a valid email address.")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_validation() {
        assert!(validate_tenant_fields("Nguyen Van A", "012345678901", None).is_ok());
        assert!(validate_tenant_fields("Nguyen Van A", "012345678901", Some("")).is_ok());
        assert!(validate_tenant_fields("", "012345678901", None).is_err());
        assert!(validate_tenant_fields("Nguyen Van A", " ", None).is_err());
        assert!(validate_tenant_fields("Nguyen Van A", "012345678901", Some("nope")).is_err());
    }
}
