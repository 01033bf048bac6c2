use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[sea_orm(unique)]
    pub id_number: String, // national ID / passport
    pub date_of_birth: Option<ChronoDate>,
    pub hometown: Option<String>,
    pub occupation: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::contract_tenant::Entity")]
    ContractTenants,
    #[sea_orm(has_many = "super::residency_record::Entity")]
    ResidencyRecords,
}

impl Related<super::contract_tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContractTenants.def()
    }
}

impl Related<super::residency_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResidencyRecords.def()
    }
}

impl Related<super::contract::Entity> for Entity {
    fn to() -> RelationDef {
        super::contract_tenant::Relation::Contract.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::contract_tenant::Relation::Tenant.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
