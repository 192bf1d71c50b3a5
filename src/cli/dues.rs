use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::balance::{balance_as_of, collection_risk};
use crate::cli::{colored_balance, month_or_current, open_scope, parse_month};
use crate::error::Result;
use crate::fmt::{amount, money};

pub fn pay(apartment: u32, month: &str, value: f64) -> Result<()> {
    let month = parse_month(month)?;
    let mut scope = open_scope()?;
    scope.update_dues_payment(apartment, month, value)?;
    let row = scope.state.dues_row(apartment);
    println!(
        "Apartment {apartment} {month}: {} (balance {})",
        money(value),
        money(row.map(|r| r.balance).unwrap_or(0.0))
    );
    Ok(())
}

pub fn extra(apartment: u32, column: &str, value: f64) -> Result<()> {
    let mut scope = open_scope()?;
    if !scope.state.extra_fee_columns.iter().any(|c| c == column) {
        println!("{}", format!("Note: '{column}' is not a listed fee column.").yellow());
    }
    scope.update_extra_fee(apartment, column, value)?;
    println!("Apartment {apartment} {column}: {}", money(value));
    Ok(())
}

pub fn elevator(apartment: u32, value: f64) -> Result<()> {
    let mut scope = open_scope()?;
    scope.update_elevator_payment(apartment, value)?;
    println!("Apartment {apartment} elevator: {}", money(value));
    Ok(())
}

pub fn list(month: Option<String>) -> Result<()> {
    let current = month_or_current(month.as_deref())?;
    let scope = open_scope()?;
    let s = &scope.state;

    let mut header = vec!["No".to_string(), "Resident".to_string(), "Carried".to_string()];
    header.extend(current.through().map(|m| m.name().chars().take(3).collect::<String>()));
    header.extend(s.extra_fee_columns.iter().cloned());
    header.extend(["Elevator", "Late fee", "Balance", "Year-end"].map(String::from));

    let mut table = Table::new();
    table.set_header(header);
    let mut at_risk = Vec::new();
    for row in &s.dues {
        let Some(apt) = s.apartment(row.apartment) else { continue };
        let view = balance_as_of(apt, row, &s.policy, current);
        let risk = collection_risk(row, apt.is_manager, &s.policy, current);
        if risk.at_risk {
            at_risk.push((apt.number, risk.max_consecutive_unpaid));
        }

        let mut cells = vec![
            Cell::new(apt.number),
            Cell::new(&apt.resident_name),
            Cell::new(amount(row.carried_over)),
        ];
        for m in current.through() {
            let paid = row.paid(m);
            let text = amount(paid);
            cells.push(Cell::new(if !apt.is_manager && paid < s.policy.monthly_dues {
                text.red().to_string()
            } else {
                text
            }));
        }
        for c in &s.extra_fee_columns {
            cells.push(Cell::new(amount(row.extra_fees.get(c).copied().unwrap_or(0.0))));
        }
        cells.push(Cell::new(amount(row.elevator_paid)));
        cells.push(Cell::new(amount(view.late_fee)));
        cells.push(Cell::new(colored_balance(view.balance)));
        cells.push(Cell::new(amount(row.balance)));
        table.add_row(cells);
    }
    println!("Dues {} (through {current})\n{table}", s.year);

    for (number, streak) in at_risk {
        println!(
            "{}",
            format!("Apartment {number}: {streak} months unpaid in a row").red().bold()
        );
    }
    Ok(())
}
