use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;

use crate::db::entities::{bill, contract, room};
use crate::db::enums::{BillStatus, ContractStatus, RoomStatus};
use crate::db::services::contract_service::{list_expiring_soon, LifecycleSettings};
use crate::web::error::AppError;
use crate::web::models::contract_models::ContractView;

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomCounts {
    pub total: usize,
    pub available: usize,
    pub occupied: usize,
    pub reserved: usize,
    pub maintenance: usize,
}

impl RoomCounts {
    pub fn tally(statuses: impl IntoIterator<Item = RoomStatus>) -> Self {
        let mut counts = RoomCounts::default();
        for status in statuses {
            counts.total += 1;
            match status {
                RoomStatus::Available => counts.available += 1,
                RoomStatus::Occupied => counts.occupied += 1,
                RoomStatus::Reserved => counts.reserved += 1,
                RoomStatus::Maintenance => counts.maintenance += 1,
            }
        }
        counts
    }
}

/// Sum of bill totals, or `None` when it does not fit in an i64.
pub fn outstanding_total<'a>(bills: impl IntoIterator<Item = &'a bill::Model>) -> Option<i64> {
    bills.into_iter().try_fold(0i64, |total, b| total.checked_add(b.total_amount))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub rooms: RoomCounts,
    pub active_contracts: u64,
    pub pending_contracts: u64,
    pub expiring_soon: Vec<ContractView>,
    pub unpaid_bills: usize,
    pub overdue_bills: usize,
    pub outstanding_amount: i64,
}

pub async fn get_dashboard(db: &DatabaseConnection, settings: &LifecycleSettings) -> Result<DashboardStats, AppError> {
    let rooms = room::Entity::find().all(db).await?;
    let active_contracts = contract::Entity::find()
        .filter(contract::Column::Status.eq(ContractStatus::Active))
        .count(db)
        .await?;
    let pending_contracts = contract::Entity::find()
        .filter(contract::Column::Status.eq(ContractStatus::Pending))
        .count(db)
        .await?;
    let outstanding = bill::Entity::find()
        .filter(bill::Column::Status.is_in([BillStatus::Unpaid, BillStatus::Overdue]))
        .all(db)
        .await?;
    let outstanding_amount = outstanding_total(&outstanding)
        .ok_or_else(|| AppError::InternalServerError("Outstanding bill total exceeds the supported range".to_string()))?;

    Ok(DashboardStats {
        rooms: RoomCounts::tally(rooms.iter().map(|r| r.status)),
        active_contracts,
        pending_contracts,
        expiring_soon: list_expiring_soon(db, settings).await?,
        unpaid_bills: outstanding.iter().filter(|b| b.status == BillStatus::Unpaid).count(),
        overdue_bills: outstanding.iter().filter(|b| b.status == BillStatus::Overdue).count(),
        outstanding_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::aggregator::fixtures::bill;

    #[test]
    fn outstanding_total_detects_overflow() {
        let small = [
            bill(1, 1, 1, 2024, 1, 1_500_000, BillStatus::Unpaid),
            bill(2, 1, 1, 2024, 2, 2_000_000, BillStatus::Overdue),
        ];
        assert_eq!(outstanding_total(&small), Some(3_500_000));

        let huge = i64::MAX / 2 + 1;
        let large = [
            bill(1, 1, 1, 2024, 1, huge, BillStatus::Unpaid),
            bill(2, 2, 2, 2024, 1, huge, BillStatus::Overdue),
        ];
        assert_eq!(outstanding_total(&large), None);
        assert_eq!(outstanding_total([]), Some(0));
    }

    #[test]
    fn tallies_rooms_by_status() {
        let counts = RoomCounts::tally([
            RoomStatus::Available,
            RoomStatus::Occupied,
            RoomStatus::Occupied,
            RoomStatus::Maintenance,
        ]);
        assert_eq!(
            counts,
            RoomCounts {
                total: 4,
                available: 1,
                occupied: 2,
                reserved: 0,
                maintenance: 1,
            }
        );
    }
}
