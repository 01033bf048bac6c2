use chrono::{Datelike, Duration, NaiveDate};

/// Amounts for the bill issued when a tenant checks out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalBillDraft {
    pub month: u32,
    pub year: i32,
    pub days_stayed: i64,
    pub rent_amount: i64,
    pub due_date: NaiveDate,
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn days_in_month(date: NaiveDate) -> i64 {
    let first = first_of_month(date);
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.map(|n| (n - first).num_days()).unwrap_or(30)
}

/// Rent for the checkout month, prorated over the days actually stayed
/// (checkout day included, never before the lease started).
pub fn final_bill_draft(
    monthly_rent: i64,
    contract_start: NaiveDate,
    checkout_date: NaiveDate,
    due_days: i64,
) -> FinalBillDraft {
    let period_start = first_of_month(checkout_date).max(contract_start);
    let days_stayed = ((checkout_date - period_start).num_days() + 1).max(0);
    let month_days = days_in_month(checkout_date);
    // days_stayed never exceeds month_days, so the result fits back in i64.
    let prorated = (i128::from(monthly_rent) * i128::from(days_stayed) + i128::from(month_days / 2))
        / i128::from(month_days);
    let rent_amount = i64::try_from(prorated).unwrap_or(monthly_rent);

    FinalBillDraft {
        month: checkout_date.month(),
        year: checkout_date.year(),
        days_stayed,
        rent_amount,
        due_date: checkout_date + Duration::days(due_days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn full_month_is_full_rent() {
        let draft = final_bill_draft(3_000_000, d(2023, 5, 1), d(2024, 4, 30), 7);
        assert_eq!(draft.days_stayed, 30);
        assert_eq!(draft.rent_amount, 3_000_000);
        assert_eq!((draft.month, draft.year), (4, 2024));
        assert_eq!(draft.due_date, d(2024, 5, 7));
    }

    #[test]
    fn partial_month_is_prorated() {
        let draft = final_bill_draft(3_100_000, d(2023, 5, 1), d(2024, 1, 10), 7);
        assert_eq!(draft.days_stayed, 10);
        assert_eq!(draft.rent_amount, 1_000_000);
    }

    #[test]
    fn lease_started_mid_month_counts_from_start() {
        let draft = final_bill_draft(2_900_000, d(2024, 2, 20), d(2024, 2, 29), 0);
        assert_eq!(draft.days_stayed, 10);
        assert_eq!(draft.rent_amount, 1_000_000);
    }

    #[test]
    fn large_rent_does_not_overflow() {
        let rent = i64::MAX / 10;
        let draft = final_bill_draft(rent, d(2024, 1, 1), d(2024, 3, 20), 7);
        assert_eq!(draft.days_stayed, 20);
        assert_eq!(draft.rent_amount, ((rent as i128 * 20 + 15) / 31) as i64);

        let whole = final_bill_draft(i64::MAX, d(2024, 1, 1), d(2024, 3, 31), 7);
        assert_eq!(whole.rent_amount, i64::MAX);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(d(2024, 2, 10)), 29);
        assert_eq!(days_in_month(d(2023, 2, 10)), 28);
        assert_eq!(days_in_month(d(2024, 12, 31)), 31);
    }
}
