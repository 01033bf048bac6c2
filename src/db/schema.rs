//! Table bootstrap and the fixed set of entity repositories.

use sea_orm::{
    sea_query::Index, ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    Schema,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::entities::{bill, contract, contract_tenant, residency_record, room, setting, tenant, user};

/// Every table the server owns. Anything that needs to walk "all tables"
/// goes through this list instead of looking tables up by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Setting,
    Room,
    Tenant,
    Contract,
    ContractTenant,
    Bill,
    ResidencyRecord,
}

impl EntityKind {
    /// Ordered so that referenced tables come first.
    pub const ALL: [EntityKind; 8] = [
        EntityKind::User,
        EntityKind::Setting,
        EntityKind::Room,
        EntityKind::Tenant,
        EntityKind::Contract,
        EntityKind::ContractTenant,
        EntityKind::Bill,
        EntityKind::ResidencyRecord,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Setting => "settings",
            EntityKind::Room => "rooms",
            EntityKind::Tenant => "tenants",
            EntityKind::Contract => "contracts",
            EntityKind::ContractTenant => "contract_tenants",
            EntityKind::Bill => "bills",
            EntityKind::ResidencyRecord => "residency_records",
        }
    }

    pub async fn create_table(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        match self {
            EntityKind::User => create_table(db, user::Entity).await,
            EntityKind::Setting => create_table(db, setting::Entity).await,
            EntityKind::Room => create_table(db, room::Entity).await,
            EntityKind::Tenant => create_table(db, tenant::Entity).await,
            EntityKind::Contract => create_table(db, contract::Entity).await,
            EntityKind::ContractTenant => create_table(db, contract_tenant::Entity).await,
            EntityKind::Bill => create_table(db, bill::Entity).await,
            EntityKind::ResidencyRecord => create_table(db, residency_record::Entity).await,
        }
    }

    pub async fn count(&self, db: &DatabaseConnection) -> Result<u64, DbErr> {
        match self {
            EntityKind::User => user::Entity::find().count(db).await,
            EntityKind::Setting => setting::Entity::find().count(db).await,
            EntityKind::Room => room::Entity::find().count(db).await,
            EntityKind::Tenant => tenant::Entity::find().count(db).await,
            EntityKind::Contract => contract::Entity::find().count(db).await,
            EntityKind::ContractTenant => contract_tenant::Entity::find().count(db).await,
            EntityKind::Bill => bill::Entity::find().count(db).await,
            EntityKind::ResidencyRecord => residency_record::Entity::find().count(db).await,
        }
    }
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Creates missing tables and the indexes the entity derive cannot express.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    for kind in EntityKind::ALL {
        debug!(table = kind.table_name(), "Ensuring table exists.");
        kind.create_table(db).await?;
    }

    let backend = db.get_database_backend();
    let bill_period = Index::create()
        .name("uq_bills_contract_period")
        .table(bill::Entity)
        .col(bill::Column::ContractId)
        .col(bill::Column::Year)
        .col(bill::Column::Month)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&bill_period)).await?;

    // At most one ACTIVE contract per room, enforced by the database.
    if backend == DatabaseBackend::Postgres {
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_contracts_active_room \
             ON contracts (room_id) WHERE status = 'ACTIVE'",
        )
        .await?;
    }

    info!(tables = EntityKind::ALL.len(), "Database schema is ready.");
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCount {
    pub entity: EntityKind,
    pub table: &'static str,
    pub rows: u64,
}

pub async fn table_counts(db: &DatabaseConnection) -> Result<Vec<TableCount>, DbErr> {
    let mut counts = Vec::with_capacity(EntityKind::ALL.len());
    for kind in EntityKind::ALL {
        counts.push(TableCount {
            entity: kind,
            table: kind.table_name(),
            rows: kind.count(db).await?,
        });
    }
    Ok(counts)
}
