use crate::cache::Slice;
use crate::error::{AidatError, Result};
use crate::models::{EntryKind, OperatingLedger, SummaryRow, CATEGORY_ELEVATOR, CATEGORY_INTERCOM};
use crate::month::Month;
use crate::scope::Scope;

/// Refresh income, expense and difference on each month row from the ledger.
/// Cash, bank and elevator are manual fields and are left alone. Returns
/// whether any row changed.
pub fn recompute_summary(summary: &mut [SummaryRow], ledger: &OperatingLedger) -> bool {
    let mut changed = false;
    for row in summary.iter_mut() {
        let Some(month) = row.month else { continue };
        let data = ledger.month(month);
        let income = data.total(EntryKind::Income);
        let expense = data.total(EntryKind::Expense);
        let difference = income - expense;
        if row.income != income || row.expense != expense || row.difference != difference {
            row.income = income;
            row.expense = expense;
            row.difference = difference;
            changed = true;
        }
    }
    changed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
    Income,
    Cash,
    Bank,
    Elevator,
}

impl SummaryField {
    pub fn parse(s: &str) -> Option<SummaryField> {
        match s.trim().to_lowercase().as_str() {
            "income" | "gelir" => Some(SummaryField::Income),
            "cash" | "kasa" => Some(SummaryField::Cash),
            "bank" | "banka" => Some(SummaryField::Bank),
            "elevator" | "asansör" | "asansor" => Some(SummaryField::Elevator),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IcmalRow {
    pub month: Month,
    pub income: f64,
    pub expense: f64,
    pub elevator: f64,
    pub intercom: f64,
    pub difference: f64,
    pub cash: f64,
    pub bank: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Icmal {
    pub opening_cash: f64,
    pub rows: Vec<IcmalRow>,
    pub total_income: f64,
    pub total_expense: f64,
    pub total_elevator: f64,
    pub total_intercom: f64,
    pub closing_cash: f64,
}

fn is_intercom(description: &str, category: &str) -> bool {
    category == CATEGORY_INTERCOM || description.to_lowercase().contains("diyafon")
}

/// Year overview built from the ledger. Cash accumulates month by month from
/// the carry-forward row's opening amount; bank is whatever was entered.
pub fn icmal(summary: &[SummaryRow], ledger: &OperatingLedger) -> Icmal {
    let opening_cash = summary
        .iter()
        .find(|r| r.month.is_none())
        .map(|r| r.income)
        .unwrap_or(0.0);

    let mut cash = opening_cash;
    let mut rows = Vec::with_capacity(12);
    for (month, data) in ledger.iter() {
        let income = data.total(EntryKind::Income);
        let expense = data.total(EntryKind::Expense);
        let elevator = data
            .income
            .iter()
            .filter(|e| e.category == CATEGORY_ELEVATOR)
            .map(|e| e.amount)
            .sum();
        let intercom = data
            .expense
            .iter()
            .filter(|e| is_intercom(&e.description, &e.category))
            .map(|e| e.amount)
            .sum();
        let difference = income - expense;
        cash += difference;
        let bank = summary
            .iter()
            .find(|r| r.month == Some(month))
            .map(|r| r.bank)
            .unwrap_or(0.0);
        rows.push(IcmalRow { month, income, expense, elevator, intercom, difference, cash, bank });
    }

    Icmal {
        opening_cash,
        total_income: rows.iter().map(|r| r.income).sum(),
        total_expense: rows.iter().map(|r| r.expense).sum(),
        total_elevator: rows.iter().map(|r| r.elevator).sum(),
        total_intercom: rows.iter().map(|r| r.intercom).sum(),
        closing_cash: cash,
        rows,
    }
}

impl Scope {
    /// Manual override of one summary cell. `None` targets the carry-forward
    /// row, whose income is the opening cash.
    pub fn update_summary_row(&mut self, period: Option<Month>, field: SummaryField, value: f64) -> Result<()> {
        self.require_admin()?;
        if !value.is_finite() {
            return Err(AidatError::Validation("value must be a number".into()));
        }
        if field == SummaryField::Income && period.is_some() {
            return Err(AidatError::Validation(
                "monthly income comes from the ledger; only the Devir row's income can be set".into(),
            ));
        }
        let row = self
            .state
            .summary
            .iter_mut()
            .find(|r| r.month == period)
            .ok_or_else(|| AidatError::NotFound("summary row".into()))?;
        match field {
            SummaryField::Income => row.income = value,
            SummaryField::Cash => row.cash = value,
            SummaryField::Bank => row.bank = value,
            SummaryField::Elevator => row.elevator = value,
        }
        self.cache.put(Slice::MonthlySummary, &self.state.summary)
    }

    pub fn icmal(&self) -> Icmal {
        icmal(&self.state.summary, &self.state.ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_summary, LedgerEntry};

    fn entry(kind: EntryKind, category: &str, description: &str, amount: f64) -> LedgerEntry {
        LedgerEntry {
            id: 1,
            date: String::new(),
            description: description.into(),
            category: category.into(),
            amount,
            kind,
            source: None,
            apartment: None,
            resident_name: None,
        }
    }

    fn sample_ledger() -> OperatingLedger {
        let mut ledger = OperatingLedger::default();
        let jan = ledger.month_mut(Month::Ocak);
        jan.income.push(entry(EntryKind::Income, "Aidat Ödemesi", "D:1", 1000.0));
        jan.income.push(entry(EntryKind::Income, CATEGORY_ELEVATOR, "Asansör", 300.0));
        jan.expense.push(entry(EntryKind::Expense, "Diğer", "Diyafon tamiri", 100.0));
        jan.expense.push(entry(EntryKind::Expense, "Elektrik Gideri", "Elektrik", 400.0));
        let feb = ledger.month_mut(Month::Subat);
        feb.expense.push(entry(EntryKind::Expense, CATEGORY_INTERCOM, "Kart", 50.0));
        ledger
    }

    #[test]
    fn test_recompute_merges_ledger_totals() {
        let mut summary = default_summary();
        summary[1].bank = 5000.0;
        let ledger = sample_ledger();
        assert!(recompute_summary(&mut summary, &ledger));
        assert_eq!(summary[1].income, 1300.0);
        assert_eq!(summary[1].expense, 500.0);
        assert_eq!(summary[1].difference, 800.0);
        assert_eq!(summary[1].bank, 5000.0);
        assert_eq!(summary[2].difference, -50.0);
        assert!(!recompute_summary(&mut summary, &ledger));
    }

    #[test]
    fn test_icmal_accumulates_cash() {
        let mut summary = default_summary();
        summary[0].income = 2000.0;
        summary[2].bank = 7500.0;
        let view = icmal(&summary, &sample_ledger());

        assert_eq!(view.opening_cash, 2000.0);
        assert_eq!(view.rows[0].cash, 2800.0);
        assert_eq!(view.rows[1].cash, 2750.0);
        assert_eq!(view.rows[1].bank, 7500.0);
        assert_eq!(view.rows[11].cash, 2750.0);
        assert_eq!(view.rows[0].elevator, 300.0);
        assert_eq!(view.total_intercom, 150.0);
        assert_eq!(view.total_income, 1300.0);
        assert_eq!(view.closing_cash, 2750.0);
    }

    #[test]
    fn test_summary_overrides() {
        let (_dir, mut scope) = crate::scope::testing::scope();
        scope.update_summary_row(None, SummaryField::Income, 1500.0).unwrap();
        scope.update_summary_row(Some(Month::Mart), SummaryField::Bank, 9000.0).unwrap();
        assert_eq!(scope.state.summary[0].income, 1500.0);
        assert_eq!(scope.state.summary[3].bank, 9000.0);
        assert!(scope
            .update_summary_row(Some(Month::Mart), SummaryField::Income, 1.0)
            .is_err());
        assert_eq!(scope.icmal().opening_cash, 1500.0);
    }
}
