use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{debug, info};

use crate::db::entities::{bill, contract, room};
use crate::db::enums::BillStatus;
use crate::web::error::AppError;
use crate::web::models::bill_models::{
    validate_period, BillAmounts, BillListQuery, CreateBillRequest, UpdateBillRequest,
};

// --- Bill Service Functions ---

pub async fn get_bill(db: &DatabaseConnection, bill_id: i32) -> Result<bill::Model, AppError> {
    bill::Entity::find_by_id(bill_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bill {bill_id} not found")))
}

pub async fn list_bills(db: &DatabaseConnection, query: &BillListQuery) -> Result<Vec<bill::Model>, AppError> {
    let mut select = bill::Entity::find()
        .order_by_desc(bill::Column::Year)
        .order_by_desc(bill::Column::Month)
        .order_by_asc(bill::Column::RoomId);
    if let Some(contract_id) = query.contract_id {
        select = select.filter(bill::Column::ContractId.eq(contract_id));
    }
    if let Some(room_id) = query.room_id {
        select = select.filter(bill::Column::RoomId.eq(room_id));
    }
    if let Some(status) = query.status {
        select = select.filter(bill::Column::Status.eq(status));
    }
    if let Some(month) = query.month {
        select = select.filter(bill::Column::Month.eq(month));
    }
    if let Some(year) = query.year {
        select = select.filter(bill::Column::Year.eq(year));
    }
    Ok(select.all(db).await?)
}

pub async fn create_bill(
    db: &DatabaseConnection,
    req: CreateBillRequest,
    today: NaiveDate,
    bill_due_days: i64,
) -> Result<bill::Model, AppError> {
    validate_period(req.month, req.year)?;
    let contract = contract::Entity::find_by_id(req.contract_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", req.contract_id)))?;

    let rent = match req.rent_amount {
        Some(rent) => rent,
        None => {
            room::Entity::find_by_id(contract.room_id)
                .one(db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Room {} not found", contract.room_id)))?
                .base_price
        }
    };
    let amounts = BillAmounts {
        rent,
        electric: req.electric_amount,
        water: req.water_amount,
        service: req.service_amount,
    };
    let total = amounts.validate()?;

    let duplicate = bill::Entity::find()
        .filter(bill::Column::ContractId.eq(contract.id))
        .filter(bill::Column::Month.eq(req.month))
        .filter(bill::Column::Year.eq(req.year))
        .count(db)
        .await?;
    if duplicate > 0 {
        return Err(AppError::Conflict(format!(
            "Contract {} already has a bill for {:04}-{:02}",
            contract.contract_number, req.year, req.month
        )));
    }

    let now = Utc::now();
    let created = bill::ActiveModel {
        contract_id: Set(contract.id),
        room_id: Set(contract.room_id),
        month: Set(req.month),
        year: Set(req.year),
        rent_amount: Set(amounts.rent),
        electric_amount: Set(amounts.electric),
        water_amount: Set(amounts.water),
        service_amount: Set(amounts.service),
        total_amount: Set(total),
        status: Set(BillStatus::Unpaid),
        due_date: Set(req.due_date.unwrap_or(today + Duration::days(bill_due_days))),
        paid_date: Set(None),
        notes: Set(req.notes),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        bill_id = created.id,
        contract_id = created.contract_id,
        period = %format!("{:04}-{:02}", created.year, created.month),
        total = created.total_amount,
        "Bill created."
    );
    Ok(created)
}

/// Amount edits recompute the total. Paid bills are frozen.
pub async fn update_bill(
    db: &DatabaseConnection,
    bill_id: i32,
    req: UpdateBillRequest,
) -> Result<bill::Model, AppError> {
    let existing = get_bill(db, bill_id).await?;
    if existing.status == BillStatus::Paid {
        return Err(AppError::Conflict(format!("Bill {bill_id} is already paid and cannot be edited")));
    }

    let amounts = BillAmounts {
        rent: req.rent_amount.unwrap_or(existing.rent_amount),
        electric: req.electric_amount.unwrap_or(existing.electric_amount),
        water: req.water_amount.unwrap_or(existing.water_amount),
        service: req.service_amount.unwrap_or(existing.service_amount),
    };
    let total = amounts.validate()?;
    let due_date = req.due_date.unwrap_or(existing.due_date);
    let notes = req.notes.or_else(|| existing.notes.clone());

    let mut active = existing.into_active_model();
    active.rent_amount = Set(amounts.rent);
    active.electric_amount = Set(amounts.electric);
    active.water_amount = Set(amounts.water);
    active.service_amount = Set(amounts.service);
    active.total_amount = Set(total);
    active.due_date = Set(due_date);
    active.notes = Set(notes);
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

pub async fn pay_bill(
    db: &DatabaseConnection,
    bill_id: i32,
    paid_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<bill::Model, AppError> {
    let existing = get_bill(db, bill_id).await?;
    if existing.status == BillStatus::Paid {
        return Err(AppError::Conflict(format!("Bill {bill_id} is already paid")));
    }

    let mut active = existing.into_active_model();
    active.status = Set(BillStatus::Paid);
    active.paid_date = Set(Some(paid_date.unwrap_or(today)));
    active.updated_at = Set(Utc::now());
    let paid = active.update(db).await?;

    info!(bill_id, total = paid.total_amount, "Bill paid.");
    Ok(paid)
}

pub async fn delete_bill(db: &DatabaseConnection, bill_id: i32) -> Result<(), AppError> {
    let existing = get_bill(db, bill_id).await?;
    bill::Entity::delete_by_id(existing.id).exec(db).await?;
    info!(bill_id, contract_id = existing.contract_id, "Bill deleted.");
    Ok(())
}

/// Flags every UNPAID bill whose due date has passed as OVERDUE.
pub async fn mark_overdue_bills(db: &DatabaseConnection, today: NaiveDate) -> Result<u64, AppError> {
    let result = bill::Entity::update_many()
        .set(bill::ActiveModel {
            status: Set(BillStatus::Overdue),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(bill::Column::Status.eq(BillStatus::Unpaid))
        .filter(bill::Column::DueDate.lt(today))
        .exec(db)
        .await?;
    debug!(rows = result.rows_affected, %today, "Overdue bill sweep finished.");
    Ok(result.rows_affected)
}
