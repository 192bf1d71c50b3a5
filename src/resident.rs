use crate::balance::{self, AsOfBalance, CollectionRisk};
use crate::error::{AidatError, Result};
use crate::models::{Apartment, DuesRow, EntryKind};
use crate::month::Month;
use crate::scope::State;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthStatus {
    pub month: Month,
    pub due: f64,
    pub paid: f64,
}

impl MonthStatus {
    pub fn is_paid(&self) -> bool {
        self.paid >= self.due
    }
}

/// What a resident sees when they sign in with their access code.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidentStatement {
    pub apartment: Apartment,
    pub year: i32,
    pub current: Month,
    pub balance: AsOfBalance,
    pub risk: CollectionRisk,
    pub current_month_paid: bool,
    pub months: Vec<MonthStatus>,
    pub total_expenses: f64,
    pub expense_share: f64,
}

pub fn resident_statement(state: &State, access_code: &str, current: Month) -> Result<ResidentStatement> {
    let code = access_code.trim().to_uppercase();
    let apartment = state
        .apartments
        .iter()
        .find(|a| a.access_code.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(&code)))
        .ok_or_else(|| AidatError::NotFound("no apartment for that access code".into()))?
        .clone();

    let empty = DuesRow::new(apartment.number, &apartment.resident_name);
    let row = state.dues_row(apartment.number).unwrap_or(&empty);
    let policy = &state.policy;
    let due = if apartment.is_manager { 0.0 } else { policy.monthly_dues };

    let months: Vec<MonthStatus> = current
        .through()
        .map(|month| MonthStatus { month, due, paid: row.paid(month) })
        .collect();
    let current_month_paid = months.last().is_some_and(MonthStatus::is_paid);

    let payers = state.apartments.iter().filter(|a| !a.is_manager).count().max(1);
    let total_expenses = state.ledger.total(EntryKind::Expense);

    Ok(ResidentStatement {
        balance: balance::balance_as_of(&apartment, row, policy, current),
        risk: balance::collection_risk(row, apartment.is_manager, policy, current),
        year: state.year,
        current,
        current_month_paid,
        months,
        total_expenses,
        expense_share: total_expenses / payers as f64,
        apartment,
    })
}
