use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::db::entities::{bill, contract, contract_tenant, room, tenant};
use crate::db::enums::{BillStatus, ContractStatus, RoomStatus};
use crate::lifecycle::{
    action_for_target, final_bill_draft, plan_transition, ContractSnapshot, ContractTimeline, TransitionAction,
    TransitionPolicy,
};
use crate::server::config::ServerConfig;
use crate::web::error::AppError;
use crate::web::models::contract_models::{
    normalize_tenant_selection, validate_contract_terms, ContractListQuery, ContractTenantView, ContractView,
    CreateContractRequest, ReplaceTenantsRequest, UpdateContractRequest,
};

/// The knobs every lifecycle operation needs, fixed for one request.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleSettings {
    pub today: NaiveDate,
    pub policy: TransitionPolicy,
    pub expiring_soon_days: i64,
    pub bill_due_days: i64,
}

impl LifecycleSettings {
    pub fn from_config(config: &ServerConfig, today: NaiveDate) -> Self {
        Self {
            today,
            policy: config.transition_policy(),
            expiring_soon_days: config.expiring_soon_days,
            bill_due_days: config.bill_due_days,
        }
    }
}

// --- Reads ---

pub async fn find_contract<C: ConnectionTrait>(conn: &C, contract_id: i32) -> Result<contract::Model, AppError> {
    contract::Entity::find_by_id(contract_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contract {contract_id} not found")))
}

pub async fn active_contract_for_room<C: ConnectionTrait>(
    conn: &C,
    room_id: i32,
) -> Result<Option<contract::Model>, AppError> {
    Ok(contract::Entity::find()
        .filter(contract::Column::RoomId.eq(room_id))
        .filter(contract::Column::Status.eq(ContractStatus::Active))
        .one(conn)
        .await?)
}

/// Attaches room numbers, tenants and the derived timeline to contracts.
pub async fn build_views<C: ConnectionTrait>(
    conn: &C,
    contracts: Vec<contract::Model>,
    settings: &LifecycleSettings,
) -> Result<Vec<ContractView>, AppError> {
    if contracts.is_empty() {
        return Ok(Vec::new());
    }
    let room_ids: Vec<i32> = contracts.iter().map(|c| c.room_id).collect();
    let contract_ids: Vec<i32> = contracts.iter().map(|c| c.id).collect();

    let room_numbers: HashMap<i32, String> = room::Entity::find()
        .filter(room::Column::Id.is_in(room_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| (r.id, r.number))
        .collect();

    let members = contract_tenant::Entity::find()
        .filter(contract_tenant::Column::ContractId.is_in(contract_ids))
        .find_also_related(tenant::Entity)
        .all(conn)
        .await?;

    let mut tenants_by_contract: HashMap<i32, Vec<ContractTenantView>> = HashMap::new();
    for (member, tenant) in members {
        let Some(tenant) = tenant else { continue };
        tenants_by_contract
            .entry(member.contract_id)
            .or_default()
            .push(ContractTenantView {
                tenant_id: tenant.id,
                full_name: tenant.full_name,
                phone: tenant.phone,
                is_primary: member.is_primary,
            });
    }

    Ok(contracts
        .into_iter()
        .map(|c| {
            let mut tenants = tenants_by_contract.remove(&c.id).unwrap_or_default();
            tenants.sort_by_key(|t| (!t.is_primary, t.tenant_id));
            ContractView {
                timeline: ContractTimeline::compute(
                    c.status,
                    c.start_date,
                    c.end_date,
                    settings.today,
                    settings.expiring_soon_days,
                ),
                room_number: room_numbers.get(&c.room_id).cloned(),
                tenants,
                contract: c,
            }
        })
        .collect())
}

pub async fn get_contract_view(
    db: &DatabaseConnection,
    contract_id: i32,
    settings: &LifecycleSettings,
) -> Result<ContractView, AppError> {
    let model = find_contract(db, contract_id).await?;
    let mut views = build_views(db, vec![model], settings).await?;
    views
        .pop()
        .ok_or_else(|| AppError::InternalServerError("Contract view could not be built".to_string()))
}

pub async fn list_contracts(
    db: &DatabaseConnection,
    query: &ContractListQuery,
    settings: &LifecycleSettings,
) -> Result<Vec<ContractView>, AppError> {
    let mut select = contract::Entity::find().order_by_desc(contract::Column::CreatedAt);
    if let Some(status) = query.status {
        select = select.filter(contract::Column::Status.eq(status));
    }
    if let Some(room_id) = query.room_id {
        select = select.filter(contract::Column::RoomId.eq(room_id));
    }
    if let Some(tenant_id) = query.tenant_id {
        let contract_ids: Vec<i32> = contract_tenant::Entity::find()
            .filter(contract_tenant::Column::TenantId.eq(tenant_id))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.contract_id)
            .collect();
        select = select.filter(contract::Column::Id.is_in(contract_ids));
    }

    let views = build_views(db, select.all(db).await?, settings).await?;
    Ok(match query.badge {
        Some(badge) => views.into_iter().filter(|v| v.timeline.badge == badge).collect(),
        None => views,
    })
}

/// ACTIVE contracts whose end date falls inside the warning window.
pub async fn list_expiring_soon(
    db: &DatabaseConnection,
    settings: &LifecycleSettings,
) -> Result<Vec<ContractView>, AppError> {
    let until = settings.today + chrono::Duration::days(settings.expiring_soon_days);
    let contracts = contract::Entity::find()
        .filter(contract::Column::Status.eq(ContractStatus::Active))
        .filter(contract::Column::EndDate.gte(settings.today))
        .filter(contract::Column::EndDate.lte(until))
        .order_by_asc(contract::Column::EndDate)
        .all(db)
        .await?;
    build_views(db, contracts, settings).await
}

// --- Creation and edits ---

async fn ensure_tenants_exist<C: ConnectionTrait>(conn: &C, tenant_ids: &[i32]) -> Result<(), AppError> {
    let found = tenant::Entity::find()
        .filter(tenant::Column::Id.is_in(tenant_ids.to_vec()))
        .count(conn)
        .await?;
    if found as usize != tenant_ids.len() {
        return Err(AppError::NotFound("One or more tenants do not exist".to_string()));
    }
    Ok(())
}

async fn insert_members<C: ConnectionTrait>(
    conn: &C,
    contract_id: i32,
    tenant_ids: &[i32],
    primary_tenant_id: i32,
) -> Result<(), AppError> {
    let rows = tenant_ids.iter().map(|tenant_id| contract_tenant::ActiveModel {
        contract_id: Set(contract_id),
        tenant_id: Set(*tenant_id),
        is_primary: Set(*tenant_id == primary_tenant_id),
    });
    contract_tenant::Entity::insert_many(rows).exec(conn).await?;
    Ok(())
}

/// Auto-numbered creates retry this many times when another request took
/// the same number first.
const CONTRACT_NUMBER_ATTEMPTS: usize = 3;

fn contract_number_prefix(today: NaiveDate) -> String {
    format!("HD{}", today.format("%Y%m%d"))
}

/// Next free sequence for `prefix`, one past the highest `{prefix}-{NNN}`
/// already taken. Numbers that share the prefix but not the shape are
/// ignored.
fn next_sequence<'a>(prefix: &str, taken: impl IntoIterator<Item = &'a str>) -> u32 {
    let stem = format!("{prefix}-");
    taken
        .into_iter()
        .filter_map(|number| number.strip_prefix(stem.as_str()))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .map_or(1, |highest| highest.saturating_add(1))
}

/// `HD{YYYYMMDD}-{NNN}`, numbered per day.
async fn next_contract_number<C: ConnectionTrait>(conn: &C, today: NaiveDate) -> Result<String, AppError> {
    let prefix = contract_number_prefix(today);
    let taken: Vec<String> = contract::Entity::find()
        .select_only()
        .column(contract::Column::ContractNumber)
        .filter(contract::Column::ContractNumber.starts_with(&prefix))
        .into_tuple::<String>()
        .all(conn)
        .await?;
    let sequence = next_sequence(&prefix, taken.iter().map(String::as_str));
    Ok(format!("{prefix}-{sequence:03}"))
}

async fn insert_contract(
    db: &DatabaseConnection,
    req: &CreateContractRequest,
    requested_number: Option<&str>,
    tenant_ids: &[i32],
    primary_tenant_id: i32,
    today: NaiveDate,
) -> Result<contract::Model, AppError> {
    let txn = db.begin().await?;

    room::Entity::find_by_id(req.room_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Room {} not found", req.room_id)))?;
    ensure_tenants_exist(&txn, tenant_ids).await?;

    let contract_number = match requested_number {
        Some(number) => {
            let exists = contract::Entity::find()
                .filter(contract::Column::ContractNumber.eq(number))
                .count(&txn)
                .await?;
            if exists > 0 {
                return Err(AppError::Conflict(format!("Contract number {number} is already in use")));
            }
            number.to_string()
        }
        None => next_contract_number(&txn, today).await?,
    };

    let now = Utc::now();
    let created = contract::ActiveModel {
        contract_number: Set(contract_number),
        room_id: Set(req.room_id),
        start_date: Set(req.start_date),
        end_date: Set(req.end_date),
        deposit: Set(req.deposit),
        status: Set(ContractStatus::Pending),
        checked_in_at: Set(None),
        terminated_at: Set(None),
        status_reason: Set(None),
        notes: Set(req.notes.clone()),
        version: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    insert_members(&txn, created.id, tenant_ids, primary_tenant_id).await?;
    txn.commit().await?;
    Ok(created)
}

pub async fn create_contract(
    db: &DatabaseConnection,
    req: CreateContractRequest,
    settings: &LifecycleSettings,
) -> Result<ContractView, AppError> {
    validate_contract_terms(req.start_date, req.end_date, req.deposit)?;
    let (tenant_ids, primary_tenant_id) = normalize_tenant_selection(&req.tenant_ids, req.primary_tenant_id)?;
    let requested_number = req
        .contract_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let mut attempt = 1;
    let created = loop {
        match insert_contract(db, &req, requested_number.as_deref(), &tenant_ids, primary_tenant_id, settings.today)
            .await
        {
            Err(AppError::Conflict(reason)) if requested_number.is_none() && attempt < CONTRACT_NUMBER_ATTEMPTS => {
                warn!(attempt, %reason, "Generated contract number was taken; retrying.");
                attempt += 1;
            }
            result => break result?,
        }
    };

    info!(
        contract_id = created.id,
        contract_number = %created.contract_number,
        room_id = created.room_id,
        tenants = tenant_ids.len(),
        "Contract created."
    );
    get_contract_view(db, created.id, settings).await
}

pub async fn update_contract(
    db: &DatabaseConnection,
    contract_id: i32,
    req: UpdateContractRequest,
    settings: &LifecycleSettings,
) -> Result<ContractView, AppError> {
    let existing = find_contract(db, contract_id).await?;

    let dates_changed = req.start_date.is_some_and(|d| d != existing.start_date)
        || req.end_date.is_some_and(|d| d != existing.end_date);
    if dates_changed && existing.status != ContractStatus::Pending {
        return Err(AppError::InvalidInput(
            "Dates can only be edited before check-in; extend the contract instead.".to_string(),
        ));
    }

    let start_date = req.start_date.unwrap_or(existing.start_date);
    let end_date = req.end_date.unwrap_or(existing.end_date);
    let deposit = req.deposit.unwrap_or(existing.deposit);
    validate_contract_terms(start_date, end_date, deposit)?;

    let patch = contract::ActiveModel {
        start_date: Set(start_date),
        end_date: Set(end_date),
        deposit: Set(deposit),
        notes: Set(req.notes.or_else(|| existing.notes.clone())),
        version: Set(existing.version + 1),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    write_contract(db, &existing, patch).await?;
    get_contract_view(db, contract_id, settings).await
}

pub async fn replace_tenants(
    db: &DatabaseConnection,
    contract_id: i32,
    req: ReplaceTenantsRequest,
    settings: &LifecycleSettings,
) -> Result<ContractView, AppError> {
    let (tenant_ids, primary_tenant_id) = normalize_tenant_selection(&req.tenant_ids, req.primary_tenant_id)?;

    let txn = db.begin().await?;
    let existing = find_contract(&txn, contract_id).await?;
    if matches!(existing.status, ContractStatus::Expired | ContractStatus::Terminated) {
        return Err(AppError::InvalidInput(format!(
            "Tenants of a {} contract cannot be changed.",
            existing.status
        )));
    }
    ensure_tenants_exist(&txn, &tenant_ids).await?;

    contract_tenant::Entity::delete_many()
        .filter(contract_tenant::Column::ContractId.eq(contract_id))
        .exec(&txn)
        .await?;
    insert_members(&txn, contract_id, &tenant_ids, primary_tenant_id).await?;
    txn.commit().await?;

    info!(contract_id, tenants = tenant_ids.len(), primary_tenant_id, "Contract tenants replaced.");
    get_contract_view(db, contract_id, settings).await
}

pub async fn extend_contract(
    db: &DatabaseConnection,
    contract_id: i32,
    new_end_date: NaiveDate,
    settings: &LifecycleSettings,
) -> Result<ContractView, AppError> {
    let existing = find_contract(db, contract_id).await?;
    if existing.status != ContractStatus::Active {
        return Err(AppError::InvalidInput(format!(
            "Only active contracts can be extended; this one is {}.",
            existing.status
        )));
    }
    if new_end_date <= existing.end_date {
        return Err(AppError::InvalidInput(format!(
            "New end date {new_end_date} must be after the current end date {}.",
            existing.end_date
        )));
    }

    let patch = contract::ActiveModel {
        end_date: Set(new_end_date),
        version: Set(existing.version + 1),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    write_contract(db, &existing, patch).await?;
    info!(contract_id, old_end = %existing.end_date, new_end = %new_end_date, "Contract extended.");
    get_contract_view(db, contract_id, settings).await
}

/// Applies `patch` only if nobody changed the row since `existing` was read.
async fn write_contract<C: ConnectionTrait>(
    conn: &C,
    existing: &contract::Model,
    patch: contract::ActiveModel,
) -> Result<(), AppError> {
    let result = contract::Entity::update_many()
        .set(patch)
        .filter(contract::Column::Id.eq(existing.id))
        .filter(contract::Column::Version.eq(existing.version))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        warn!(contract_id = existing.id, version = existing.version, "Contract changed concurrently.");
        return Err(AppError::Conflict(format!(
            "Contract {} was modified by another request; reload and try again",
            existing.contract_number
        )));
    }
    Ok(())
}

async fn write_room<C: ConnectionTrait>(conn: &C, existing: &room::Model, status: RoomStatus) -> Result<(), AppError> {
    if existing.status == status {
        return Ok(());
    }
    let patch = room::ActiveModel {
        status: Set(status),
        version: Set(existing.version + 1),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    let result = room::Entity::update_many()
        .set(patch)
        .filter(room::Column::Id.eq(existing.id))
        .filter(room::Column::Version.eq(existing.version))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        warn!(room_id = existing.id, "Room occupancy changed concurrently.");
        return Err(AppError::Conflict(format!(
            "Room {} was modified by another request; reload and try again",
            existing.number
        )));
    }
    Ok(())
}

async fn issue_final_bill<C: ConnectionTrait>(
    conn: &C,
    contract: &contract::Model,
    room: &room::Model,
    settings: &LifecycleSettings,
) -> Result<Option<bill::Model>, AppError> {
    let draft = final_bill_draft(room.base_price, contract.start_date, settings.today, settings.bill_due_days);
    let already_billed = bill::Entity::find()
        .filter(bill::Column::ContractId.eq(contract.id))
        .filter(bill::Column::Month.eq(draft.month as i32))
        .filter(bill::Column::Year.eq(draft.year))
        .count(conn)
        .await?;
    if already_billed > 0 {
        debug!(contract_id = contract.id, month = draft.month, year = draft.year, "Final period already billed.");
        return Ok(None);
    }

    let now = Utc::now();
    let created = bill::ActiveModel {
        contract_id: Set(contract.id),
        room_id: Set(contract.room_id),
        month: Set(draft.month as i32),
        year: Set(draft.year),
        rent_amount: Set(draft.rent_amount),
        electric_amount: Set(0),
        water_amount: Set(0),
        service_amount: Set(0),
        total_amount: Set(draft.rent_amount),
        status: Set(BillStatus::Unpaid),
        due_date: Set(draft.due_date),
        paid_date: Set(None),
        notes: Set(Some(format!("Final bill: {} day(s) in the checkout month", draft.days_stayed))),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(Some(created))
}

// --- Transitions ---

/// Reads contract and room, validates `action`, then writes both rows in
/// one transaction. Losing a race on either row yields `Conflict`.
pub async fn apply_transition(
    db: &DatabaseConnection,
    contract_id: i32,
    action: TransitionAction,
    settings: &LifecycleSettings,
) -> Result<ContractView, AppError> {
    let txn = db.begin().await?;

    let current = find_contract(&txn, contract_id).await?;
    let room = room::Entity::find_by_id(current.room_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Room {} not found", current.room_id)))?;
    let other_active = contract::Entity::find()
        .filter(contract::Column::RoomId.eq(current.room_id))
        .filter(contract::Column::Status.eq(ContractStatus::Active))
        .filter(contract::Column::Id.ne(current.id))
        .count(&txn)
        .await?;

    let snapshot = ContractSnapshot {
        status: current.status,
        end_date: current.end_date,
        room_status: room.status,
        room_has_other_active: other_active > 0,
    };
    let plan = plan_transition(&action, &snapshot, settings.today, &settings.policy).map_err(|e| {
        debug!(contract_id, action = action.name(), error = %e, "Transition rejected.");
        AppError::from(e)
    })?;

    let mut patch = contract::ActiveModel {
        status: Set(plan.to),
        status_reason: Set(plan.reason.clone()),
        version: Set(current.version + 1),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    if plan.marks_check_in {
        patch.checked_in_at = Set(Some(settings.today));
        patch.terminated_at = Set(None);
    }
    if plan.marks_termination {
        patch.terminated_at = Set(Some(settings.today));
    }
    write_contract(&txn, &current, patch).await?;
    write_room(&txn, &room, plan.room_status).await?;

    if plan.issue_final_bill {
        if let Some(final_bill) = issue_final_bill(&txn, &current, &room, settings).await? {
            info!(
                contract_id,
                bill_id = final_bill.id,
                amount = final_bill.total_amount,
                "Final bill issued on check-out."
            );
        }
    }

    txn.commit().await?;
    info!(
        contract_id,
        room_id = room.id,
        action = action.name(),
        from = %plan.from,
        to = %plan.to,
        room_status = %plan.room_status,
        "Contract transition applied."
    );

    get_contract_view(db, contract_id, settings).await
}

pub async fn check_in(
    db: &DatabaseConnection,
    contract_id: i32,
    settings: &LifecycleSettings,
) -> Result<ContractView, AppError> {
    apply_transition(db, contract_id, TransitionAction::CheckIn, settings).await
}

pub async fn check_out(
    db: &DatabaseConnection,
    contract_id: i32,
    reason: Option<String>,
    settings: &LifecycleSettings,
) -> Result<ContractView, AppError> {
    apply_transition(db, contract_id, TransitionAction::CheckOut { reason }, settings).await
}

/// Generic entry point: resolves the target status to a transition.
pub async fn change_status(
    db: &DatabaseConnection,
    contract_id: i32,
    status: &str,
    reason: Option<String>,
    settings: &LifecycleSettings,
) -> Result<ContractView, AppError> {
    let target: ContractStatus = status.parse().map_err(AppError::InvalidInput)?;
    let current = find_contract(db, contract_id).await?;
    let action = action_for_target(current.status, target, reason)?;
    apply_transition(db, contract_id, action, settings).await
}

/// Moves every ACTIVE contract past its end date to EXPIRED. Failures are
/// logged per contract and do not stop the sweep.
pub async fn expire_overdue_contracts(db: &DatabaseConnection, settings: &LifecycleSettings) -> Result<u64, AppError> {
    let overdue = contract::Entity::find()
        .filter(contract::Column::Status.eq(ContractStatus::Active))
        .filter(contract::Column::EndDate.lt(settings.today))
        .all(db)
        .await?;

    let mut expired = 0;
    for candidate in overdue {
        let action = TransitionAction::MarkExpired {
            reason: Some("End date passed".to_string()),
        };
        match apply_transition(db, candidate.id, action, settings).await {
            Ok(_) => expired += 1,
            Err(e) => {
                error!(contract_id = candidate.id, error = %e, "Failed to expire contract.");
            }
        }
    }
    Ok(expired)
}

// --- Deletion ---

pub async fn delete_contract(db: &DatabaseConnection, contract_id: i32, confirm: Option<&str>) -> Result<(), AppError> {
    let txn = db.begin().await?;
    let existing = find_contract(&txn, contract_id).await?;

    let outstanding = bill::Entity::find()
        .filter(bill::Column::ContractId.eq(contract_id))
        .filter(bill::Column::Status.is_in([BillStatus::Unpaid, BillStatus::Overdue]))
        .count(&txn)
        .await?;
    if outstanding > 0 && confirm.map(str::trim) != Some(existing.contract_number.as_str()) {
        return Err(AppError::InvalidInput(format!(
            "Contract {} has {outstanding} unpaid bill(s); repeat the contract number in `confirm` to delete it.",
            existing.contract_number
        )));
    }

    if existing.status == ContractStatus::Active {
        let room = room::Entity::find_by_id(existing.room_id).one(&txn).await?;
        if let Some(room) = room {
            write_room(&txn, &room, RoomStatus::Available).await?;
        }
    }

    bill::Entity::delete_many()
        .filter(bill::Column::ContractId.eq(contract_id))
        .exec(&txn)
        .await?;
    contract_tenant::Entity::delete_many()
        .filter(contract_tenant::Column::ContractId.eq(contract_id))
        .exec(&txn)
        .await?;
    contract::Entity::delete_by_id(contract_id).exec(&txn).await?;
    txn.commit().await?;

    info!(
        contract_id,
        contract_number = %existing.contract_number,
        outstanding_bills = outstanding,
        "Contract deleted."
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    use crate::reports::aggregator::fixtures;

    fn settings(today: NaiveDate) -> LifecycleSettings {
        LifecycleSettings {
            today,
            policy: TransitionPolicy::default(),
            expiring_soon_days: 30,
            bill_due_days: 7,
        }
    }

    fn count(n: i64) -> Vec<BTreeMap<&'static str, Value>> {
        vec![BTreeMap::from([("num_items", Value::BigInt(Some(n)))])]
    }

    fn updated(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn room_in(status: RoomStatus) -> room::Model {
        room::Model {
            status,
            ..fixtures::room(1, fixtures::d(2023, 1, 1))
        }
    }

    fn contract_in(status: ContractStatus) -> contract::Model {
        fixtures::contract(7, 1, fixtures::d(2024, 1, 1), fixtures::d(2024, 12, 31), status, None)
    }

    fn statements(db: DatabaseConnection) -> String {
        format!("{:?}", db.into_transaction_log())
    }

    #[tokio::test]
    async fn check_in_marks_room_occupied() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![contract_in(ContractStatus::Pending)]])
            .append_query_results([vec![room_in(RoomStatus::Available)]])
            .append_query_results([count(0)])
            // contract view reloaded after commit
            .append_query_results([vec![contract_in(ContractStatus::Active)]])
            .append_query_results([vec![room_in(RoomStatus::Occupied)]])
            .append_query_results([Vec::<contract_tenant::Model>::new()])
            .append_exec_results([updated(1), updated(1)])
            .into_connection();

        let view = check_in(&db, 7, &settings(fixtures::d(2024, 3, 10))).await.unwrap();
        assert_eq!(view.contract.status, ContractStatus::Active);
        assert_eq!(view.room_number.as_deref(), Some("P001"));

        let log = statements(db);
        assert!(log.contains("OCCUPIED"), "{log}");
        assert!(!log.contains("INSERT INTO"), "{log}");
    }

    #[tokio::test]
    async fn check_out_frees_room_and_issues_final_bill() {
        let final_bill = fixtures::bill(30, 7, 1, 2024, 3, 967_742, BillStatus::Unpaid);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![contract_in(ContractStatus::Active)]])
            .append_query_results([vec![room_in(RoomStatus::Occupied)]])
            .append_query_results([count(0)])
            .append_query_results([count(0)])
            .append_query_results([vec![final_bill]])
            .append_query_results([vec![contract_in(ContractStatus::Terminated)]])
            .append_query_results([vec![room_in(RoomStatus::Available)]])
            .append_query_results([Vec::<contract_tenant::Model>::new()])
            .append_exec_results([updated(1), updated(1)])
            .into_connection();

        let view = check_out(&db, 7, Some("moving out".into()), &settings(fixtures::d(2024, 3, 10)))
            .await
            .unwrap();
        assert_eq!(view.contract.status, ContractStatus::Terminated);

        let log = statements(db);
        assert!(log.contains("AVAILABLE"), "{log}");
        assert!(log.contains("INSERT INTO"), "{log}");
        assert!(log.contains("bills"), "{log}");
    }

    #[tokio::test]
    async fn check_out_skips_final_bill_when_period_is_billed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![contract_in(ContractStatus::Active)]])
            .append_query_results([vec![room_in(RoomStatus::Occupied)]])
            .append_query_results([count(0)])
            .append_query_results([count(1)])
            .append_query_results([vec![contract_in(ContractStatus::Terminated)]])
            .append_query_results([vec![room_in(RoomStatus::Available)]])
            .append_query_results([Vec::<contract_tenant::Model>::new()])
            .append_exec_results([updated(1), updated(1)])
            .into_connection();

        check_out(&db, 7, None, &settings(fixtures::d(2024, 3, 10))).await.unwrap();

        let log = statements(db);
        assert!(log.contains("AVAILABLE"), "{log}");
        assert!(!log.contains("INSERT INTO"), "{log}");
    }

    #[tokio::test]
    async fn stale_contract_version_is_a_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![contract_in(ContractStatus::Pending)]])
            .append_query_results([vec![room_in(RoomStatus::Available)]])
            .append_query_results([count(0)])
            .append_exec_results([updated(0)])
            .into_connection();

        let err = check_in(&db, 7, &settings(fixtures::d(2024, 3, 10))).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains("HD7")), "{err}");
    }

    #[tokio::test]
    async fn stale_room_version_is_a_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![contract_in(ContractStatus::Pending)]])
            .append_query_results([vec![room_in(RoomStatus::Available)]])
            .append_query_results([count(0)])
            .append_exec_results([updated(1), updated(0)])
            .into_connection();

        let err = check_in(&db, 7, &settings(fixtures::d(2024, 3, 10))).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains("P001")), "{err}");
    }

    #[tokio::test]
    async fn check_in_into_maintenance_room_names_the_pair() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![contract_in(ContractStatus::Pending)]])
            .append_query_results([vec![room_in(RoomStatus::Maintenance)]])
            .append_query_results([count(0)])
            .into_connection();

        let err = check_in(&db, 7, &settings(fixtures::d(2024, 3, 10))).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition { from: ContractStatus::Pending, to: ContractStatus::Active, .. }
        ));
    }

    #[tokio::test]
    async fn delete_with_unpaid_bills_needs_the_contract_number() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![contract_in(ContractStatus::Active)]])
            .append_query_results([count(2)])
            .into_connection();

        let err = delete_contract(&db, 7, Some("HD8")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref msg) if msg.contains("2 unpaid")), "{err}");
        assert!(!statements(db).contains("DELETE"));
    }

    #[tokio::test]
    async fn confirmed_delete_frees_the_room() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![contract_in(ContractStatus::Active)]])
            .append_query_results([count(2)])
            .append_query_results([vec![room_in(RoomStatus::Occupied)]])
            // room update, bills, members, contract
            .append_exec_results([updated(1), updated(2), updated(1), updated(1)])
            .into_connection();

        delete_contract(&db, 7, Some(" HD7 ")).await.unwrap();

        let log = statements(db);
        assert!(log.contains("AVAILABLE"), "{log}");
        assert!(log.contains("DELETE FROM"), "{log}");
    }

    #[test]
    fn sequence_follows_the_highest_taken_number() {
        let prefix = contract_number_prefix(fixtures::d(2024, 3, 10));
        assert_eq!(prefix, "HD20240310");
        assert_eq!(next_sequence(&prefix, []), 1);
        assert_eq!(next_sequence(&prefix, ["HD20240310-001", "HD20240310-002"]), 3);
        // a gap left by a deletion must not reuse the highest number
        assert_eq!(next_sequence(&prefix, ["HD20240310-003"]), 4);
        // hand-entered numbers sharing the prefix do not shift the count
        assert_eq!(
            next_sequence(&prefix, ["HD20240310-002", "HD20240310-special", "HD20240310"]),
            3
        );
    }
}
