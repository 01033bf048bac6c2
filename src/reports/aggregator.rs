use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::db::entities::{bill, contract, contract_tenant, room};
use crate::db::enums::{BillStatus, ContractStatus};
use crate::lifecycle::final_bill::days_in_month;

/// A calendar month inside a report range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let first = self.first_day();
        first + chrono::Duration::days(days_in_month(first) - 1)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    fn contains_bill(&self, bill: &bill::Model) -> bool {
        bill.year == self.year && bill.month == self.month as i32
    }
}

/// Inclusive date range plus an optional room filter. An empty filter
/// means every room.
#[derive(Debug, Clone)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub room_ids: Vec<i32>,
}

impl ReportRange {
    pub fn new(start: NaiveDate, end: NaiveDate, room_ids: Vec<i32>) -> Result<Self, String> {
        if end < start {
            return Err(format!("endDate {end} is before startDate {start}"));
        }
        Ok(Self { start, end, room_ids })
    }

    pub fn periods(&self) -> Vec<Period> {
        let last = Period::of(self.end);
        let mut current = Period::of(self.start);
        let mut periods = Vec::new();
        while current <= last {
            periods.push(current);
            current = current.next();
        }
        periods
    }

    pub fn includes_room(&self, room_id: i32) -> bool {
        self.room_ids.is_empty() || self.room_ids.contains(&room_id)
    }
}

/// Everything the aggregator reads. The caller loads it; nothing here
/// touches the database.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub bills: &'a [bill::Model],
    pub rooms: &'a [room::Model],
    pub contracts: &'a [contract::Model],
    pub contract_tenants: &'a [contract_tenant::Model],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub months: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_revenue: i64,
    pub paid_revenue: i64,
    pub pending_revenue: i64,
    pub total_bills: usize,
    pub average_occupancy: f64,
    pub total_tenants: usize,
    pub period: ReportPeriod,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<T> {
    pub summary: ReportSummary,
    pub report_data: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueRow {
    pub period: String,
    pub paid_revenue: i64,
    pub pending_revenue: i64,
    pub total_revenue: i64,
    pub paid_bills: usize,
    pub unpaid_bills: usize,
    pub overdue_bills: usize,
    pub total_bills: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyRow {
    pub period: String,
    pub total_rooms: usize,
    pub occupied_rooms: usize,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillRow {
    pub period: String,
    pub total_bills: usize,
    pub paid_bills: usize,
    pub unpaid_bills: usize,
    pub overdue_bills: usize,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub unpaid_amount: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("Amounts for {scope} exceed the reportable range")]
    AmountOverflow { scope: String },
}

fn add_amount(total: i64, amount: i64, scope: &str) -> Result<i64, ReportError> {
    total.checked_add(amount).ok_or_else(|| ReportError::AmountOverflow {
        scope: scope.to_string(),
    })
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `occupied` over `total`; zero when there is nothing to
/// divide by.
pub fn occupancy_rate(occupied: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(occupied as f64 / total as f64 * 100.0)
}

/// Days a contract actually held its room. Contracts never checked in
/// held nothing.
fn occupancy_interval(contract: &contract::Model) -> Option<(NaiveDate, NaiveDate)> {
    if contract.status == ContractStatus::Pending || contract.checked_in_at.is_none() {
        return None;
    }
    let until = contract.terminated_at.map_or(contract.end_date, |t| t.min(contract.end_date));
    Some((contract.start_date, until))
}

fn overlaps(interval: (NaiveDate, NaiveDate), from: NaiveDate, to: NaiveDate) -> bool {
    interval.0 <= to && interval.1 >= from
}

fn bills_in<'a>(range: &'a ReportRange, input: ReportInput<'a>, period: Period) -> impl Iterator<Item = &'a bill::Model> {
    input
        .bills
        .iter()
        .filter(move |b| range.includes_room(b.room_id) && period.contains_bill(b))
}

pub fn revenue_rows(range: &ReportRange, input: ReportInput<'_>) -> Result<Vec<RevenueRow>, ReportError> {
    range
        .periods()
        .into_iter()
        .map(|period| {
            let label = period.label();
            let mut row = RevenueRow {
                period: label.clone(),
                paid_revenue: 0,
                pending_revenue: 0,
                total_revenue: 0,
                paid_bills: 0,
                unpaid_bills: 0,
                overdue_bills: 0,
                total_bills: 0,
            };
            for bill in bills_in(range, input, period) {
                row.total_bills += 1;
                match bill.status {
                    BillStatus::Paid => {
                        row.paid_bills += 1;
                        row.paid_revenue = add_amount(row.paid_revenue, bill.total_amount, &label)?;
                    }
                    BillStatus::Unpaid => {
                        row.unpaid_bills += 1;
                        row.pending_revenue = add_amount(row.pending_revenue, bill.total_amount, &label)?;
                    }
                    BillStatus::Overdue => {
                        row.overdue_bills += 1;
                        row.pending_revenue = add_amount(row.pending_revenue, bill.total_amount, &label)?;
                    }
                }
            }
            row.total_revenue = add_amount(row.paid_revenue, row.pending_revenue, &label)?;
            Ok(row)
        })
        .collect()
}

pub fn occupancy_rows(range: &ReportRange, input: ReportInput<'_>) -> Vec<OccupancyRow> {
    range
        .periods()
        .into_iter()
        .map(|period| {
            let (from, to) = (period.first_day(), period.last_day());
            let existing: HashSet<i32> = input
                .rooms
                .iter()
                .filter(|r| range.includes_room(r.id) && r.created_at.date_naive() <= to)
                .map(|r| r.id)
                .collect();
            let occupied: HashSet<i32> = input
                .contracts
                .iter()
                .filter(|c| existing.contains(&c.room_id))
                .filter(|c| occupancy_interval(c).is_some_and(|i| overlaps(i, from, to)))
                .map(|c| c.room_id)
                .collect();
            OccupancyRow {
                period: period.label(),
                total_rooms: existing.len(),
                occupied_rooms: occupied.len(),
                occupancy_rate: occupancy_rate(occupied.len(), existing.len()),
            }
        })
        .collect()
}

pub fn bill_rows(range: &ReportRange, input: ReportInput<'_>) -> Result<Vec<BillRow>, ReportError> {
    Ok(revenue_rows(range, input)?
        .into_iter()
        .map(|r| BillRow {
            period: r.period,
            total_bills: r.total_bills,
            paid_bills: r.paid_bills,
            unpaid_bills: r.unpaid_bills,
            overdue_bills: r.overdue_bills,
            total_amount: r.total_revenue,
            paid_amount: r.paid_revenue,
            unpaid_amount: r.pending_revenue,
        })
        .collect())
}

pub fn summarize(range: &ReportRange, input: ReportInput<'_>) -> Result<ReportSummary, ReportError> {
    let revenue = revenue_rows(range, input)?;
    let occupancy = occupancy_rows(range, input);

    let paid_revenue = revenue
        .iter()
        .try_fold(0, |total, r| add_amount(total, r.paid_revenue, "the report range"))?;
    let pending_revenue = revenue
        .iter()
        .try_fold(0, |total, r| add_amount(total, r.pending_revenue, "the report range"))?;
    let total_bills: usize = revenue.iter().map(|r| r.total_bills).sum();
    let average_occupancy = if occupancy.is_empty() {
        0.0
    } else {
        let unrounded: f64 = occupancy
            .iter()
            .filter(|r| r.total_rooms > 0)
            .map(|r| r.occupied_rooms as f64 / r.total_rooms as f64 * 100.0)
            .sum();
        round2(unrounded / occupancy.len() as f64)
    };

    let overlapping: HashSet<i32> = input
        .contracts
        .iter()
        .filter(|c| range.includes_room(c.room_id))
        .filter(|c| occupancy_interval(c).is_some_and(|i| overlaps(i, range.start, range.end)))
        .map(|c| c.id)
        .collect();
    let total_tenants = input
        .contract_tenants
        .iter()
        .filter(|ct| overlapping.contains(&ct.contract_id))
        .map(|ct| ct.tenant_id)
        .collect::<HashSet<_>>()
        .len();

    Ok(ReportSummary {
        total_revenue: add_amount(paid_revenue, pending_revenue, "the report range")?,
        paid_revenue,
        pending_revenue,
        total_bills,
        average_occupancy,
        total_tenants,
        period: ReportPeriod {
            from: range.start,
            to: range.end,
            months: occupancy.len(),
        },
    })
}

pub fn revenue_report(range: &ReportRange, input: ReportInput<'_>) -> Result<Report<RevenueRow>, ReportError> {
    Ok(Report {
        summary: summarize(range, input)?,
        report_data: revenue_rows(range, input)?,
    })
}

pub fn occupancy_report(range: &ReportRange, input: ReportInput<'_>) -> Result<Report<OccupancyRow>, ReportError> {
    Ok(Report {
        summary: summarize(range, input)?,
        report_data: occupancy_rows(range, input),
    })
}

pub fn bill_report(range: &ReportRange, input: ReportInput<'_>) -> Result<Report<BillRow>, ReportError> {
    Ok(Report {
        summary: summarize(range, input)?,
        report_data: bill_rows(range, input)?,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::db::enums::RoomStatus;

    pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    pub fn room(id: i32, created: NaiveDate) -> room::Model {
        let ts = Utc.from_utc_datetime(&created.and_hms_opt(0, 0, 0).unwrap());
        room::Model {
            id,
            number: format!("P{id:03}"),
            floor: 1,
            area: 20.0,
            capacity: 2,
            base_price: 3_000_000,
            status: RoomStatus::Available,
            description: None,
            version: 0,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn contract(
        id: i32,
        room_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        status: ContractStatus,
        terminated_at: Option<NaiveDate>,
    ) -> contract::Model {
        let ts = Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0).unwrap());
        contract::Model {
            id,
            contract_number: format!("HD{id}"),
            room_id,
            start_date: start,
            end_date: end,
            deposit: 1_000_000,
            status,
            checked_in_at: (status != ContractStatus::Pending).then_some(start),
            terminated_at,
            status_reason: None,
            notes: None,
            version: 0,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn bill(id: i32, contract_id: i32, room_id: i32, year: i32, month: u32, total: i64, status: BillStatus) -> bill::Model {
        let ts = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap();
        bill::Model {
            id,
            contract_id,
            room_id,
            month: month as i32,
            year,
            rent_amount: total,
            electric_amount: 0,
            water_amount: 0,
            service_amount: 0,
            total_amount: total,
            status,
            due_date: d(year, month, 10),
            paid_date: (status == BillStatus::Paid).then(|| d(year, month, 5)),
            notes: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn member(contract_id: i32, tenant_id: i32, is_primary: bool) -> contract_tenant::Model {
        contract_tenant::Model {
            contract_id,
            tenant_id,
            is_primary,
        }
    }
}
