use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{open_scope, parse_month};
use crate::error::{AidatError, Result};
use crate::fmt::{amount, money};
use crate::summary::SummaryField;

fn signed(value: f64) -> String {
    if value < 0.0 {
        amount(value).red().to_string()
    } else {
        amount(value)
    }
}

pub fn show() -> Result<()> {
    let scope = open_scope()?;
    let icmal = scope.icmal();

    let mut table = Table::new();
    table.set_header(vec!["Month", "Income", "Expense", "Elevator", "Intercom", "Net", "Cash", "Bank"]);
    table.add_row(vec![
        Cell::new("DEVİR".bold()),
        Cell::new(amount(icmal.opening_cash)),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(amount(icmal.opening_cash)),
        Cell::new(""),
    ]);
    for r in &icmal.rows {
        table.add_row(vec![
            Cell::new(r.month),
            Cell::new(amount(r.income)),
            Cell::new(amount(r.expense)),
            Cell::new(amount(r.elevator)),
            Cell::new(amount(r.intercom)),
            Cell::new(signed(r.difference)),
            Cell::new(signed(r.cash)),
            Cell::new(amount(r.bank)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL".bold()),
        Cell::new(amount(icmal.total_income)),
        Cell::new(amount(icmal.total_expense)),
        Cell::new(amount(icmal.total_elevator)),
        Cell::new(amount(icmal.total_intercom)),
        Cell::new(signed(icmal.total_income - icmal.total_expense)),
        Cell::new(signed(icmal.closing_cash)),
        Cell::new(""),
    ]);
    println!("İcmal {}\n{table}", scope.state.year);
    println!("Closing cash: {}", money(icmal.closing_cash));
    Ok(())
}

pub fn set(period: &str, field: &str, value: f64) -> Result<()> {
    let period = match period.trim().to_lowercase().as_str() {
        "devir" | "carry" => None,
        other => Some(parse_month(other)?),
    };
    let field = SummaryField::parse(field).ok_or_else(|| {
        AidatError::Validation(format!("field must be cash, bank, elevator or income, got '{field}'"))
    })?;
    let mut scope = open_scope()?;
    scope.update_summary_row(period, field, value)?;
    println!("Summary updated");
    Ok(())
}
