use chrono::Datelike;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;

use crate::db::entities::{bill, contract, contract_tenant, room};
use crate::reports::{
    bill_report, occupancy_report, revenue_report, BillRow, OccupancyRow, Report, ReportInput, ReportRange, RevenueRow,
};
use crate::web::error::AppError;

/// Everything a report over `range` can touch, loaded once.
#[derive(Debug, Default)]
pub struct ReportData {
    pub bills: Vec<bill::Model>,
    pub rooms: Vec<room::Model>,
    pub contracts: Vec<contract::Model>,
    pub contract_tenants: Vec<contract_tenant::Model>,
}

impl ReportData {
    pub fn input(&self) -> ReportInput<'_> {
        ReportInput {
            bills: &self.bills,
            rooms: &self.rooms,
            contracts: &self.contracts,
            contract_tenants: &self.contract_tenants,
        }
    }
}

/// Coarse database filters; the aggregator applies the exact period and
/// room rules.
pub async fn load_report_data(db: &DatabaseConnection, range: &ReportRange) -> Result<ReportData, AppError> {
    let mut bills = bill::Entity::find()
        .filter(bill::Column::Year.gte(range.start.year()))
        .filter(bill::Column::Year.lte(range.end.year()));
    let mut rooms = room::Entity::find();
    let mut contracts = contract::Entity::find()
        .filter(contract::Column::StartDate.lte(range.end))
        .filter(contract::Column::EndDate.gte(range.start));

    if !range.room_ids.is_empty() {
        bills = bills.filter(bill::Column::RoomId.is_in(range.room_ids.clone()));
        rooms = rooms.filter(room::Column::Id.is_in(range.room_ids.clone()));
        contracts = contracts.filter(contract::Column::RoomId.is_in(range.room_ids.clone()));
    }

    let bills = bills.all(db).await?;
    let rooms = rooms.all(db).await?;
    let contracts = contracts.all(db).await?;
    let contract_tenants = if contracts.is_empty() {
        Vec::new()
    } else {
        contract_tenant::Entity::find()
            .filter(contract_tenant::Column::ContractId.is_in(contracts.iter().map(|c| c.id).collect::<Vec<_>>()))
            .all(db)
            .await?
    };

    debug!(
        from = %range.start,
        to = %range.end,
        bills = bills.len(),
        rooms = rooms.len(),
        contracts = contracts.len(),
        "Loaded report data."
    );
    Ok(ReportData {
        bills,
        rooms,
        contracts,
        contract_tenants,
    })
}

pub async fn build_revenue_report(db: &DatabaseConnection, range: &ReportRange) -> Result<Report<RevenueRow>, AppError> {
    let data = load_report_data(db, range).await?;
    Ok(revenue_report(range, data.input())?)
}

pub async fn build_occupancy_report(
    db: &DatabaseConnection,
    range: &ReportRange,
) -> Result<Report<OccupancyRow>, AppError> {
    let data = load_report_data(db, range).await?;
    Ok(occupancy_report(range, data.input())?)
}

pub async fn build_bill_report(db: &DatabaseConnection, range: &ReportRange) -> Result<Report<BillRow>, AppError> {
    let data = load_report_data(db, range).await?;
    Ok(bill_report(range, data.input())?)
}
