use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::enums::ContractStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contracts")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub contract_number: String,
    pub room_id: i32,
    pub start_date: ChronoDate,
    pub end_date: ChronoDate,
    pub deposit: i64,
    pub status: ContractStatus,
    pub checked_in_at: Option<ChronoDate>,
    pub terminated_at: Option<ChronoDate>,
    #[sea_orm(column_type = "Text", nullable)]
    pub status_reason: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub version: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::room::Entity",
        from = "Column::RoomId",
        to = "super::room::Column::Id",
        on_delete = "Restrict",
        on_update = "Cascade"
    )]
    Room,
    #[sea_orm(has_many = "super::contract_tenant::Entity")]
    ContractTenants,
    #[sea_orm(has_many = "super::bill::Entity")]
    Bills,
}

impl Related<super::room::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Room.def()
    }
}

impl Related<super::contract_tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContractTenants.def()
    }
}

impl Related<super::bill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        super::contract_tenant::Relation::Tenant.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::contract_tenant::Relation::Contract.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
