use crate::models::{Apartment, DuesRow, FeePolicy};
use crate::month::Month;

/// Flat monthly penalty on each elapsed month's unpaid shortfall.
pub const LATE_FEE_RATE: f64 = 0.05;

/// Consecutive underpaid months at which an apartment is flagged for collection.
pub const COLLECTION_RISK_STREAK: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub total_paid: f64,
    pub balance: f64,
}

/// Full-year view: what the apartment owes for the whole year against
/// everything it has paid. Used for the cached row totals and for rollover.
pub fn compute_totals(apartment: &Apartment, row: &DuesRow, policy: &FeePolicy) -> Totals {
    let expected_dues = if apartment.is_manager { 0.0 } else { 12.0 * policy.monthly_dues };
    let expected_elevator = if apartment.elevator_liable { policy.annual_elevator_fee } else { 0.0 };

    let total_paid = total_paid(row);
    Totals {
        total_paid,
        balance: (row.carried_over + expected_dues + expected_elevator) - total_paid,
    }
}

pub fn total_paid(row: &DuesRow) -> f64 {
    let regular: f64 = row.monthly_payments.values().sum();
    let extra: f64 = row.extra_fees.values().sum();
    regular + row.elevator_paid + extra
}

/// Rewrite the cached totals on `row`.
pub fn apply_totals(apartment: &Apartment, row: &mut DuesRow, policy: &FeePolicy) {
    let totals = compute_totals(apartment, row, policy);
    row.total_paid = totals.total_paid;
    row.balance = totals.balance;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsOfBalance {
    pub carried_over: f64,
    pub accrued_dues: f64,
    pub expected_elevator: f64,
    pub late_fee: f64,
    pub total_paid: f64,
    pub balance: f64,
}

/// Day-to-day view: dues accrue only through `current`, and the late fee on
/// elapsed months is added to what is owed.
pub fn balance_as_of(
    apartment: &Apartment,
    row: &DuesRow,
    policy: &FeePolicy,
    current: Month,
) -> AsOfBalance {
    let accrued_dues = if apartment.is_manager {
        0.0
    } else {
        policy.monthly_dues * current.through().count() as f64
    };
    let expected_elevator = if apartment.elevator_liable { policy.annual_elevator_fee } else { 0.0 };
    let late_fee = late_fee(row, apartment.is_manager, policy, current);
    let total_paid = total_paid(row);

    AsOfBalance {
        carried_over: row.carried_over,
        accrued_dues,
        expected_elevator,
        late_fee,
        total_paid,
        balance: row.carried_over + accrued_dues + expected_elevator + late_fee - total_paid,
    }
}

/// 5% of each fully elapsed month's shortfall, summed. The current month is
/// never penalised.
pub fn late_fee(row: &DuesRow, is_manager: bool, policy: &FeePolicy, current: Month) -> f64 {
    if is_manager {
        return 0.0;
    }
    current
        .before()
        .map(|m| (policy.monthly_dues - row.paid(m)).max(0.0) * LATE_FEE_RATE)
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionRisk {
    pub max_consecutive_unpaid: u32,
    pub at_risk: bool,
}

/// Longest run of underpaid months from January through `current`. The scan
/// starts fresh each year.
pub fn collection_risk(
    row: &DuesRow,
    is_manager: bool,
    policy: &FeePolicy,
    current: Month,
) -> CollectionRisk {
    let mut streak = 0u32;
    let mut max_streak = 0u32;
    for m in current.through() {
        if !is_manager && row.paid(m) < policy.monthly_dues {
            streak += 1;
            max_streak = max_streak.max(streak);
        } else {
            streak = 0;
        }
    }
    CollectionRisk {
        max_consecutive_unpaid: max_streak,
        at_risk: max_streak >= COLLECTION_RISK_STREAK && !is_manager,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apartment(is_manager: bool, elevator_liable: bool) -> Apartment {
        Apartment {
            number: 1,
            resident_name: "Ayşe Yılmaz".into(),
            owner_name: "Ayşe Yılmaz".into(),
            owner_phone: None,
            resident_phone: None,
            elevator_liable,
            is_manager,
            block: None,
            access_code: None,
        }
    }

    fn policy() -> FeePolicy {
        FeePolicy { monthly_dues: 750.0, annual_elevator_fee: 600.0 }
    }

    fn row_with(payments: &[(Month, f64)]) -> DuesRow {
        let mut row = DuesRow::new(1, "Ayşe Yılmaz");
        for (m, amt) in payments {
            row.monthly_payments.insert(*m, *amt);
        }
        row
    }

    #[test]
    fn test_fully_paid_year_balances_to_zero() {
        let payments: Vec<(Month, f64)> = Month::ALL.iter().map(|m| (*m, 750.0)).collect();
        let mut row = row_with(&payments);
        row.elevator_paid = 600.0;
        let totals = compute_totals(&apartment(false, true), &row, &policy());
        assert_eq!(totals.total_paid, 9600.0);
        assert_eq!(totals.balance, 0.0);
    }

    #[test]
    fn test_totals_are_deterministic() {
        let mut row = row_with(&[(Month::Ocak, 300.0), (Month::Subat, 750.0)]);
        row.extra_fees.insert("Yakıt".into(), 120.0);
        row.carried_over = 45.5;
        let apt = apartment(false, false);
        let a = compute_totals(&apt, &row, &policy());
        let b = compute_totals(&apt, &row, &policy());
        assert_eq!(a, b);
        assert_eq!(a.total_paid, 1170.0);
        assert_eq!(a.balance, 45.5 + 9000.0 - 1170.0);
    }

    #[test]
    fn test_manager_owes_no_dues() {
        let row = row_with(&[]);
        let totals = compute_totals(&apartment(true, false), &row, &policy());
        assert_eq!(totals.balance, 0.0);
        assert_eq!(late_fee(&row, true, &policy(), Month::Aralik), 0.0);
        let risk = collection_risk(&row, true, &policy(), Month::Aralik);
        assert_eq!(risk.max_consecutive_unpaid, 0);
        assert!(!risk.at_risk);
    }

    #[test]
    fn test_late_fee_on_elapsed_months_only() {
        let row = row_with(&[(Month::Ocak, 0.0), (Month::Subat, 750.0), (Month::Mart, 300.0)]);
        let fee = late_fee(&row, false, &policy(), Month::Nisan);
        assert!((fee - 60.0).abs() < 1e-9, "got {fee}");
    }

    #[test]
    fn test_late_fee_ignores_current_month() {
        let row = row_with(&[]);
        assert_eq!(late_fee(&row, false, &policy(), Month::Ocak), 0.0);
    }

    #[test]
    fn test_three_unpaid_months_is_collection_risk() {
        let row = row_with(&[(Month::Ocak, 0.0), (Month::Subat, 0.0), (Month::Mart, 0.0)]);
        let risk = collection_risk(&row, false, &policy(), Month::Mart);
        assert!(risk.at_risk);
        assert!(risk.max_consecutive_unpaid >= 3);
    }

    #[test]
    fn test_streak_resets_on_full_payment() {
        let row = row_with(&[
            (Month::Ocak, 0.0),
            (Month::Subat, 0.0),
            (Month::Mart, 750.0),
            (Month::Nisan, 0.0),
        ]);
        let risk = collection_risk(&row, false, &policy(), Month::Nisan);
        assert_eq!(risk.max_consecutive_unpaid, 2);
        assert!(!risk.at_risk);
    }

    #[test]
    fn test_as_of_balance_accrues_through_current_month() {
        let row = row_with(&[(Month::Ocak, 750.0)]);
        let view = balance_as_of(&apartment(false, false), &row, &policy(), Month::Mart);
        assert_eq!(view.accrued_dues, 2250.0);
        assert!((view.late_fee - 37.5).abs() < 1e-9);
        assert!((view.balance - (2250.0 + 37.5 - 750.0)).abs() < 1e-9);
    }
}
