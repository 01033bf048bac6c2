//! Read-only views over a contract's dates.
//!
//! All functions work at calendar-day granularity: an end date is the last
//! day the lease is valid, so a contract ending today is neither expired nor
//! past its remaining time.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::enums::ContractStatus;

pub const DEFAULT_EXPIRING_SOON_DAYS: i64 = 30;

/// True once the end date lies strictly before `today`.
pub fn is_expired(end_date: NaiveDate, today: NaiveDate) -> bool {
    end_date < today
}

/// True when the end date falls within the next `threshold_days` days,
/// today included.
pub fn is_expiring_soon(end_date: NaiveDate, today: NaiveDate, threshold_days: i64) -> bool {
    end_date >= today && end_date <= today + Duration::days(threshold_days)
}

/// Whole days left until the end date. Negative once expired.
pub fn remaining_days(end_date: NaiveDate, today: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

/// Length of the lease in days, independent of argument order.
pub fn contract_duration(start_date: NaiveDate, end_date: NaiveDate) -> i64 {
    (end_date - start_date).num_days().abs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractBadge {
    Pending,
    Active,
    ActiveExpiringSoon,
    Expired,
    Terminated,
}

/// Presentation status: the stored status refined by the dates.
pub fn effective_badge(
    status: ContractStatus,
    end_date: NaiveDate,
    today: NaiveDate,
    threshold_days: i64,
) -> ContractBadge {
    match status {
        ContractStatus::Pending => ContractBadge::Pending,
        ContractStatus::Terminated => ContractBadge::Terminated,
        ContractStatus::Expired => ContractBadge::Expired,
        ContractStatus::Active if is_expired(end_date, today) => ContractBadge::Expired,
        ContractStatus::Active if is_expiring_soon(end_date, today, threshold_days) => {
            ContractBadge::ActiveExpiringSoon
        }
        ContractStatus::Active => ContractBadge::Active,
    }
}

/// Derived fields attached to every contract the API returns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTimeline {
    pub badge: ContractBadge,
    pub remaining_days: i64,
    pub duration_days: i64,
    pub is_expired: bool,
    pub is_expiring_soon: bool,
}

impl ContractTimeline {
    pub fn compute(
        status: ContractStatus,
        start_date: NaiveDate,
        end_date: NaiveDate,
        today: NaiveDate,
        threshold_days: i64,
    ) -> Self {
        Self {
            badge: effective_badge(status, end_date, today, threshold_days),
            remaining_days: remaining_days(end_date, today),
            duration_days: contract_duration(start_date, end_date),
            is_expired: is_expired(end_date, today),
            is_expiring_soon: is_expiring_soon(end_date, today, threshold_days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn january_contract_duration_is_thirty_days() {
        assert_eq!(contract_duration(d(2024, 1, 1), d(2024, 1, 31)), 30);
    }

    #[test]
    fn duration_ignores_argument_order() {
        let pairs = [
            (d(2024, 1, 1), d(2024, 1, 31)),
            (d(2023, 12, 15), d(2024, 3, 2)),
            (d(2024, 2, 29), d(2025, 2, 28)),
        ];
        for (a, b) in pairs {
            assert_eq!(contract_duration(a, b), contract_duration(b, a));
        }
    }

    #[test]
    fn mid_lease_is_expiring_soon_but_not_expired() {
        let end = d(2024, 1, 31);
        let today = d(2024, 1, 20);
        assert_eq!(remaining_days(end, today), 11);
        assert!(is_expiring_soon(end, today, DEFAULT_EXPIRING_SOON_DAYS));
        assert!(!is_expired(end, today));
    }

    #[test]
    fn after_end_date_is_expired_with_negative_remaining() {
        let end = d(2024, 1, 31);
        let today = d(2024, 2, 5);
        assert_eq!(remaining_days(end, today), -5);
        assert!(is_expired(end, today));
        assert!(!is_expiring_soon(end, today, DEFAULT_EXPIRING_SOON_DAYS));
    }

    #[test]
    fn negative_remaining_days_matches_expired_flag() {
        let end = d(2024, 6, 15);
        let mut today = d(2024, 5, 1);
        while today <= d(2024, 7, 31) {
            assert_eq!(remaining_days(end, today) < 0, is_expired(end, today), "today = {today}");
            today = today.succ_opt().unwrap();
        }
    }

    #[test]
    fn expiring_soon_matches_remaining_window() {
        let end = d(2024, 6, 15);
        let mut today = d(2024, 4, 1);
        while today <= d(2024, 7, 31) {
            let remaining = remaining_days(end, today);
            assert_eq!(
                is_expiring_soon(end, today, 30),
                (0..=30).contains(&remaining),
                "today = {today}"
            );
            today = today.succ_opt().unwrap();
        }
    }

    #[test]
    fn badge_refines_only_active_contracts() {
        let end = d(2024, 1, 31);
        let today = d(2024, 1, 20);
        assert_eq!(
            effective_badge(ContractStatus::Active, end, today, 30),
            ContractBadge::ActiveExpiringSoon
        );
        assert_eq!(
            effective_badge(ContractStatus::Active, end, d(2023, 10, 1), 30),
            ContractBadge::Active
        );
        assert_eq!(
            effective_badge(ContractStatus::Terminated, end, today, 30),
            ContractBadge::Terminated
        );
        assert_eq!(
            effective_badge(ContractStatus::Pending, end, today, 30),
            ContractBadge::Pending
        );
        assert_eq!(
            effective_badge(ContractStatus::Active, end, d(2024, 2, 1), 30),
            ContractBadge::Expired
        );
    }

    #[test]
    fn timeline_bundles_all_derivations() {
        let timeline =
            ContractTimeline::compute(ContractStatus::Active, d(2024, 1, 1), d(2024, 1, 31), d(2024, 1, 20), 30);
        assert_eq!(timeline.remaining_days, 11);
        assert_eq!(timeline.duration_days, 30);
        assert!(timeline.is_expiring_soon);
        assert_eq!(timeline.badge, ContractBadge::ActiveExpiringSoon);
    }
}
