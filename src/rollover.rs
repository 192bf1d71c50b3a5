use std::collections::BTreeMap;

use crate::audit::AuditAction;
use crate::balance;
use crate::error::{AidatError, Result};
use crate::models::{default_staff_records, default_summary, OperatingLedger};
use crate::scope::{best_effort, Scope, YearData};

impl Scope {
    fn archive_current(&mut self) -> Result<()> {
        let year = self.state.year;
        self.cache.put_archive(year, &self.state.snapshot())?;
        self.state.register_year(year);
        Ok(())
    }

    /// Close the active year and open the next one. Each apartment's
    /// full-year balance becomes both its carried-over amount and its
    /// balance; the new year's dues accrue on the next recompute.
    pub fn start_new_year(&mut self) -> Result<i32> {
        self.require_admin()?;
        self.archive_current()?;

        let policy = self.state.policy;
        let closed = self.state.year;
        let next = closed + 1;
        for row in &mut self.state.dues {
            let carried = match self.state.apartments.iter().find(|a| a.number == row.apartment) {
                Some(apt) => balance::compute_totals(apt, row, &policy).balance,
                None => row.balance,
            };
            row.carried_over = carried;
            row.monthly_payments = BTreeMap::new();
            row.extra_fees = BTreeMap::new();
            row.elevator_paid = 0.0;
            row.total_paid = 0.0;
            row.balance = carried;
        }
        for row in &self.state.dues {
            best_effort(
                "save_opening_balance",
                self.store.save_opening_balance(&self.session.building_id, next, row),
            );
        }

        self.state.year = next;
        self.state.register_year(next);
        self.state.ledger = OperatingLedger::default();
        self.state.summary = default_summary();
        self.state.staff = default_staff_records();
        self.save_all()?;

        tracing::info!(from = closed, to = next, "new year started");
        self.audit(AuditAction::YearStarted, &format!("{closed} -> {next}"))?;
        Ok(next)
    }

    /// Archive the active year, then load `target` from its archive. The
    /// active year stays loaded when no archive exists for `target`.
    pub fn switch_year(&mut self, target: i32) -> Result<()> {
        self.require_admin()?;
        if target == self.state.year {
            return Ok(());
        }
        self.archive_current()?;
        let data: YearData = self.cache.get_archive(target)?.ok_or(AidatError::NoArchive(target))?;

        let from = self.state.year;
        self.state.year = target;
        self.state.dues = data.dues;
        self.state.ledger = data.ledger;
        self.state.summary = data.monthly_summary;
        self.state.staff = data.staff_records;
        self.state.apartments = data.apartments;
        self.state.extra_fee_columns = data.extra_fee_columns;
        self.state.register_year(target);
        self.state.ensure_dues_rows();
        self.state.recompute_all_totals();
        self.state.resync();
        self.save_all()?;

        self.audit(AuditAction::YearSwitched, &format!("{from} -> {target}"))
    }

    pub fn available_years(&self) -> &[i32] {
        &self.state.available_years
    }

    /// Registered years, other than the active one, that can be switched to.
    pub fn archived_years(&self) -> Result<Vec<i32>> {
        let mut years = Vec::new();
        for &year in &self.state.available_years {
            if year != self.state.year && self.cache.get_archive::<YearData>(year)?.is_some() {
                years.push(year);
            }
        }
        Ok(years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::Month;
    use crate::scope::testing::*;

    fn pay_all_but(scope: &mut Scope, number: u32, short: f64) {
        for month in Month::ALL {
            scope.update_dues_payment(number, month, 750.0).unwrap();
        }
        scope.update_dues_payment(number, Month::Aralik, 750.0 - short).unwrap();
        scope.update_elevator_payment(number, 600.0).unwrap();
    }

    #[test]
    fn test_rollover_carries_full_year_balance() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        add(&mut scope, 2, "Veli");
        pay_all_but(&mut scope, 1, 0.0);
        scope.update_dues_payment(1, Month::Aralik, 950.0).unwrap();
        pay_all_but(&mut scope, 2, 300.0);
        let year = scope.state.year;

        let next = scope.start_new_year().unwrap();
        assert_eq!(next, year + 1);
        assert_eq!(scope.state.year, next);

        let ali = scope.state.dues_row(1).unwrap();
        assert_eq!(ali.carried_over, -200.0);
        assert_eq!(ali.balance, ali.carried_over);
        assert!(ali.monthly_payments.is_empty());
        assert_eq!(ali.elevator_paid, 0.0);
        assert_eq!(scope.state.dues_row(2).unwrap().carried_over, 300.0);

        assert!(scope.state.ledger.month(Month::Ocak).income.is_empty());
        assert_eq!(scope.state.summary[1].income, 0.0);
        assert_eq!(scope.available_years(), &[year, next]);
    }

    #[test]
    fn test_switch_back_restores_archive() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        scope.update_dues_payment(1, Month::Mart, 750.0).unwrap();
        scope.add_extra_fee_column("Yakıt").unwrap();
        let year = scope.state.year;
        scope.start_new_year().unwrap();
        assert_eq!(scope.state.extra_fee_columns, vec!["Yakıt"]);

        scope.switch_year(year).unwrap();
        assert_eq!(scope.state.year, year);
        assert_eq!(scope.state.dues_row(1).unwrap().paid(Month::Mart), 750.0);
        assert_eq!(scope.state.ledger.month(Month::Mart).income.len(), 1);
        assert_eq!(scope.archived_years().unwrap(), vec![year + 1]);

        scope.switch_year(year + 1).unwrap();
        assert_eq!(scope.state.dues_row(1).unwrap().carried_over, 8850.0);
    }

    #[test]
    fn test_switch_to_unknown_year_changes_nothing() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        let before = scope.state.clone();
        let err = scope.switch_year(1999).unwrap_err();
        assert!(matches!(err, AidatError::NoArchive(1999)));
        assert_eq!(err.to_string(), "No data for year 1999");
        assert_eq!(scope.state, before);
    }

    #[test]
    fn test_failed_switch_still_archives_active_year() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        scope.update_dues_payment(1, Month::Nisan, 750.0).unwrap();
        let year = scope.state.year;
        assert!(scope.cache.get_archive::<YearData>(year).unwrap().is_none());

        assert!(scope.switch_year(1999).is_err());
        let archived: YearData = scope.cache.get_archive(year).unwrap().unwrap();
        assert_eq!(archived, scope.state.snapshot());
        assert_eq!(archived.dues[0].paid(Month::Nisan), 750.0);
    }
}
