use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set};
use tracing::info;

use crate::db::entities::{residency_record, tenant};
use crate::web::error::AppError;
use crate::web::models::residency_models::{ResidencyRecordRequest, ResidencyRecordView};

// --- Residency Record Service Functions ---

pub async fn list_residency_records(
    db: &DatabaseConnection,
    tenant_id: i32,
    today: NaiveDate,
) -> Result<Vec<ResidencyRecordView>, AppError> {
    let records = residency_record::Entity::find()
        .filter(residency_record::Column::TenantId.eq(tenant_id))
        .order_by_desc(residency_record::Column::StartDate)
        .all(db)
        .await?;
    Ok(records.into_iter().map(|r| ResidencyRecordView::new(r, today)).collect())
}

async fn find_record(db: &DatabaseConnection, record_id: i32) -> Result<residency_record::Model, AppError> {
    residency_record::Entity::find_by_id(record_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Residency record {record_id} not found")))
}

pub async fn create_residency_record(
    db: &DatabaseConnection,
    tenant_id: i32,
    req: ResidencyRecordRequest,
    today: NaiveDate,
) -> Result<ResidencyRecordView, AppError> {
    req.validate()?;
    tenant::Entity::find_by_id(tenant_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tenant {tenant_id} not found")))?;

    let now = Utc::now();
    let created = residency_record::ActiveModel {
        tenant_id: Set(tenant_id),
        record_type: Set(req.record_type),
        start_date: Set(req.start_date),
        end_date: Set(req.end_date),
        notes: Set(req.notes),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(tenant_id, record_id = created.id, record_type = ?created.record_type, "Residency record created.");
    Ok(ResidencyRecordView::new(created, today))
}

pub async fn update_residency_record(
    db: &DatabaseConnection,
    record_id: i32,
    req: ResidencyRecordRequest,
    today: NaiveDate,
) -> Result<ResidencyRecordView, AppError> {
    req.validate()?;
    let mut active = find_record(db, record_id).await?.into_active_model();
    active.record_type = Set(req.record_type);
    active.start_date = Set(req.start_date);
    active.end_date = Set(req.end_date);
    active.notes = Set(req.notes);
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;
    Ok(ResidencyRecordView::new(updated, today))
}

pub async fn delete_residency_record(db: &DatabaseConnection, record_id: i32) -> Result<(), AppError> {
    let existing = find_record(db, record_id).await?;
    residency_record::Entity::delete_by_id(existing.id).exec(db).await?;
    info!(record_id, tenant_id = existing.tenant_id, "Residency record deleted.");
    Ok(())
}
