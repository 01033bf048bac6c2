use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::db::entities::{contract, tenant};
use crate::db::enums::ContractStatus;
use crate::db::services::contract_service::{build_views, LifecycleSettings};
use crate::db::services::residency_service::list_residency_records;
use crate::web::error::AppError;
use crate::web::models::tenant_models::{
    validate_tenant_fields, CreateTenantRequest, TenantDetail, TenantListQuery, UpdateTenantRequest,
};

// --- Tenant Service Functions ---

pub async fn get_tenant(db: &DatabaseConnection, tenant_id: i32) -> Result<tenant::Model, AppError> {
    tenant::Entity::find_by_id(tenant_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tenant {tenant_id} not found")))
}

/// Lists tenants, optionally filtered by a case-insensitive match on
/// name, phone or ID number.
pub async fn list_tenants(db: &DatabaseConnection, query: &TenantListQuery) -> Result<Vec<tenant::Model>, AppError> {
    let mut select = tenant::Entity::find().order_by_asc(tenant::Column::FullName);
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{term}%");
        select = select.filter(
            Condition::any()
                .add(Expr::col(tenant::Column::FullName).ilike(pattern.as_str()))
                .add(Expr::col(tenant::Column::Phone).ilike(pattern.as_str()))
                .add(Expr::col(tenant::Column::IdNumber).ilike(pattern.as_str())),
        );
    }
    Ok(select.all(db).await?)
}

/// The tenant with every contract they signed and their residency records.
pub async fn get_tenant_detail(
    db: &DatabaseConnection,
    tenant_id: i32,
    settings: &LifecycleSettings,
) -> Result<TenantDetail, AppError> {
    let tenant = get_tenant(db, tenant_id).await?;
    let contracts = tenant
        .find_related(contract::Entity)
        .order_by_desc(contract::Column::StartDate)
        .all(db)
        .await?;
    let contracts = build_views(db, contracts, settings).await?;
    let residency_records = list_residency_records(db, tenant_id, settings.today).await?;

    Ok(TenantDetail {
        tenant,
        contracts,
        residency_records,
    })
}

async fn ensure_id_number_free(db: &DatabaseConnection, id_number: &str, except_id: Option<i32>) -> Result<(), AppError> {
    let mut select = tenant::Entity::find().filter(tenant::Column::IdNumber.eq(id_number));
    if let Some(id) = except_id {
        select = select.filter(tenant::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(AppError::Conflict(format!("A tenant with ID number {id_number} already exists")));
    }
    Ok(())
}

pub async fn create_tenant(db: &DatabaseConnection, req: CreateTenantRequest) -> Result<tenant::Model, AppError> {
    let full_name = req.full_name.trim().to_string();
    let id_number = req.id_number.trim().to_string();
    validate_tenant_fields(&full_name, &id_number, req.email.as_deref())?;
    ensure_id_number_free(db, &id_number, None).await?;

    let now = Utc::now();
    let created = tenant::ActiveModel {
        full_name: Set(full_name),
        phone: Set(req.phone),
        email: Set(req.email.filter(|e| !e.is_empty())),
        id_number: Set(id_number),
        date_of_birth: Set(req.date_of_birth),
        hometown: Set(req.hometown),
        occupation: Set(req.occupation),
        notes: Set(req.notes),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(tenant_id = created.id, "Tenant created.");
    Ok(created)
}

pub async fn update_tenant(
    db: &DatabaseConnection,
    tenant_id: i32,
    req: UpdateTenantRequest,
) -> Result<tenant::Model, AppError> {
    let existing = get_tenant(db, tenant_id).await?;

    let full_name = req.full_name.map(|n| n.trim().to_string()).unwrap_or_else(|| existing.full_name.clone());
    let id_number = req.id_number.map(|n| n.trim().to_string()).unwrap_or_else(|| existing.id_number.clone());
    let email = req.email.or_else(|| existing.email.clone());
    validate_tenant_fields(&full_name, &id_number, email.as_deref())?;
    if id_number != existing.id_number {
        ensure_id_number_free(db, &id_number, Some(tenant_id)).await?;
    }

    let phone = req.phone.or_else(|| existing.phone.clone());
    let date_of_birth = req.date_of_birth.or(existing.date_of_birth);
    let hometown = req.hometown.or_else(|| existing.hometown.clone());
    let occupation = req.occupation.or_else(|| existing.occupation.clone());
    let notes = req.notes.or_else(|| existing.notes.clone());

    let mut active = existing.into_active_model();
    active.full_name = Set(full_name);
    active.id_number = Set(id_number);
    active.email = Set(email.filter(|e| !e.is_empty()));
    active.phone = Set(phone);
    active.date_of_birth = Set(date_of_birth);
    active.hometown = Set(hometown);
    active.occupation = Set(occupation);
    active.notes = Set(notes);
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

/// Tenants referenced by any contract are kept for the contract history.
pub async fn delete_tenant(db: &DatabaseConnection, tenant_id: i32) -> Result<(), AppError> {
    let existing = get_tenant(db, tenant_id).await?;

    let contracts = existing.find_related(contract::Entity).all(db).await?;
    if let Some(active) = contracts.iter().find(|c| c.status == ContractStatus::Active) {
        return Err(AppError::Conflict(format!(
            "Tenant is on active contract {} and cannot be deleted",
            active.contract_number
        )));
    }
    if !contracts.is_empty() {
        return Err(AppError::Conflict(format!(
            "Tenant appears on {} contract(s); remove them from those contracts first",
            contracts.len()
        )));
    }

    tenant::Entity::delete_by_id(tenant_id).exec(db).await?;
    info!(tenant_id, "Tenant deleted.");
    Ok(())
}
