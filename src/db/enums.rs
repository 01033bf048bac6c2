use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    /// Created with room and tenants attached, not checked in yet.
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
    #[sea_orm(string_value = "TERMINATED")]
    Terminated,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Pending => "PENDING",
            ContractStatus::Active => "ACTIVE",
            ContractStatus::Expired => "EXPIRED",
            ContractStatus::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ContractStatus::Pending),
            "ACTIVE" => Ok(ContractStatus::Active),
            "EXPIRED" => Ok(ContractStatus::Expired),
            "TERMINATED" => Ok(ContractStatus::Terminated),
            other => Err(format!("Unknown contract status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    #[sea_orm(string_value = "AVAILABLE")]
    Available,
    #[sea_orm(string_value = "OCCUPIED")]
    Occupied,
    #[sea_orm(string_value = "RESERVED")]
    Reserved,
    #[sea_orm(string_value = "MAINTENANCE")]
    Maintenance,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format!("{self:?}").to_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    #[sea_orm(string_value = "UNPAID")]
    Unpaid,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "OVERDUE")]
    Overdue,
}

impl BillStatus {
    /// Unpaid and overdue bills both count as money still owed.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, BillStatus::Unpaid | BillStatus::Overdue)
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format!("{self:?}").to_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResidencyType {
    #[sea_orm(string_value = "TEMPORARY_RESIDENCE")]
    TemporaryResidence,
    #[sea_orm(string_value = "TEMPORARY_ABSENCE")]
    TemporaryAbsence,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_status_parses_case_insensitively() {
        assert_eq!("active".parse::<ContractStatus>(), Ok(ContractStatus::Active));
        assert_eq!(" Terminated ".parse::<ContractStatus>(), Ok(ContractStatus::Terminated));
        assert!("CLOSED".parse::<ContractStatus>().is_err());
    }

    #[test]
    fn status_serializes_as_screaming_case() {
        let json = serde_json::to_string(&RoomStatus::Maintenance).unwrap();
        assert_eq!(json, "\"MAINTENANCE\"");
        assert_eq!(RoomStatus::Occupied.to_string(), "OCCUPIED");
        let parsed: BillStatus = serde_json::from_str("\"OVERDUE\"").unwrap();
        assert!(parsed.is_outstanding());
        assert!(!BillStatus::Paid.is_outstanding());
    }
}
