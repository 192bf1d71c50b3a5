use crate::audit::AuditAction;
use crate::balance;
use crate::error::{AidatError, Result};
use crate::month::Month;
use crate::scope::{best_effort, Scope};

fn check_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AidatError::Validation(format!("amount must be zero or more, got {amount}")));
    }
    Ok(())
}

impl Scope {
    /// Index of the apartment's dues row, creating it if the apartment has none yet.
    fn dues_index(&mut self, number: u32) -> Result<usize> {
        let resident = self.require_apartment(number)?.resident_name.clone();
        if let Some(i) = self.state.dues.iter().position(|d| d.apartment == number) {
            return Ok(i);
        }
        self.state.dues.push(crate::models::DuesRow::new(number, &resident));
        self.state.dues.sort_by_key(|d| d.apartment);
        self.state
            .dues
            .iter()
            .position(|d| d.apartment == number)
            .ok_or(AidatError::UnknownApartment(number))
    }

    fn refresh_totals(&mut self, i: usize) -> Result<()> {
        let number = self.state.dues[i].apartment;
        let apt = self.require_apartment(number)?.clone();
        let policy = self.state.policy;
        balance::apply_totals(&apt, &mut self.state.dues[i], &policy);
        Ok(())
    }

    /// Overwrite one month's regular dues payment. The matching ledger income
    /// row follows via the sync.
    pub fn update_dues_payment(&mut self, number: u32, month: Month, amount: f64) -> Result<()> {
        self.require_admin()?;
        check_amount(amount)?;
        let i = self.dues_index(number)?;

        self.state.dues[i].monthly_payments.insert(month, amount);
        self.refresh_totals(i)?;
        best_effort(
            "save_dues_payment",
            self.store
                .save_dues_payment(&self.session.building_id, self.state.year, number, month, amount),
        );
        self.after_dues_change()?;

        let who = self.state.dues[i].resident_name.clone();
        self.audit(AuditAction::DuesPayment, &format!("{who} - {month}: {amount} TL"))
    }

    pub fn update_extra_fee(&mut self, number: u32, column: &str, amount: f64) -> Result<()> {
        self.require_admin()?;
        check_amount(amount)?;
        let column = column.trim();
        if column.is_empty() {
            return Err(AidatError::Validation("fee column name is required".into()));
        }
        let i = self.dues_index(number)?;

        self.state.dues[i].extra_fees.insert(column.to_string(), amount);
        self.refresh_totals(i)?;
        best_effort(
            "save_extra_fee",
            self.store
                .save_extra_fee(&self.session.building_id, self.state.year, number, column, amount),
        );
        self.after_dues_change()?;
        self.audit(AuditAction::ExtraFeePayment, &format!("Daire {number} - {column}: {amount} TL"))
    }

    pub fn update_elevator_payment(&mut self, number: u32, amount: f64) -> Result<()> {
        self.require_admin()?;
        check_amount(amount)?;
        let i = self.dues_index(number)?;

        self.state.dues[i].elevator_paid = amount;
        self.refresh_totals(i)?;
        best_effort(
            "save_elevator_payment",
            self.store
                .save_elevator_payment(&self.session.building_id, self.state.year, number, amount),
        );
        self.after_dues_change()?;
        self.audit(AuditAction::ElevatorPayment, &format!("Daire {number}: {amount} TL"))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::AidatError;
    use crate::models::CATEGORY_DUES_PAYMENT;
    use crate::month::Month;
    use crate::scope::testing::*;

    #[test]
    fn test_payment_overwrites_and_recomputes() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        scope.update_dues_payment(1, Month::Ocak, 500.0).unwrap();
        scope.update_dues_payment(1, Month::Ocak, 750.0).unwrap();

        let row = scope.state.dues_row(1).unwrap();
        assert_eq!(row.paid(Month::Ocak), 750.0);
        assert_eq!(row.total_paid, 750.0);
        assert_eq!(row.balance, 12.0 * 750.0 + 600.0 - 750.0);
        assert_eq!(scope.state.audit_log[0].action, "DUES_PAYMENT");
    }

    #[test]
    fn test_payment_round_trip_through_ledger() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 3, "Zeynep");
        scope.update_dues_payment(3, Month::Mart, 500.0).unwrap();

        let march = scope.state.ledger.month(Month::Mart);
        assert_eq!(march.income.len(), 1);
        assert_eq!(march.income[0].amount, 500.0);
        assert_eq!(march.income[0].category, CATEGORY_DUES_PAYMENT);
        assert_eq!(scope.state.summary[3].income, 500.0);

        scope.update_dues_payment(3, Month::Mart, 0.0).unwrap();
        assert!(scope.state.ledger.month(Month::Mart).income.is_empty());
        assert_eq!(scope.state.summary[3].income, 0.0);
    }

    #[test]
    fn test_extra_fee_and_elevator_count_toward_total() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        scope.update_extra_fee(1, "Yakıt", 200.0).unwrap();
        scope.update_elevator_payment(1, 600.0).unwrap();
        let row = scope.state.dues_row(1).unwrap();
        assert_eq!(row.total_paid, 800.0);
        assert_eq!(row.balance, 12.0 * 750.0 - 200.0);
        assert_eq!(scope.state.ledger.total(crate::models::EntryKind::Income), 0.0);
    }

    #[test]
    fn test_rejects_negative_and_unknown() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        let err = scope.update_dues_payment(1, Month::Ocak, -5.0).unwrap_err();
        assert!(matches!(err, AidatError::Validation(_)));
        let err = scope.update_elevator_payment(9, 10.0).unwrap_err();
        assert!(matches!(err, AidatError::UnknownApartment(9)));
        assert_eq!(scope.state.dues_row(1).unwrap().total_paid, 0.0);
    }
}
