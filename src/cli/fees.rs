use comfy_table::{Cell, Table};

use crate::cli::open_scope;
use crate::error::Result;
use crate::fees::{suggested_monthly_dues, ExpenseItemUpdate};
use crate::fmt::{amount, money};

pub fn dues(value: f64) -> Result<()> {
    let mut scope = open_scope()?;
    scope.update_monthly_dues(value)?;
    println!("Monthly dues: {}", money(value));
    Ok(())
}

pub fn elevator(value: f64) -> Result<()> {
    let mut scope = open_scope()?;
    scope.update_annual_elevator_fee(value)?;
    println!("Annual elevator fee: {}", money(value));
    Ok(())
}

pub fn suggest() -> Result<()> {
    let scope = open_scope()?;
    let suggested = suggested_monthly_dues(&scope.state.expense_items);
    println!("Current monthly dues:   {}", money(scope.state.policy.monthly_dues));
    println!("Suggested from budget:  {}", money(suggested));
    println!("Apply with `aidat fees dues {suggested}`");
    Ok(())
}

pub fn name(value: &str) -> Result<()> {
    let mut scope = open_scope()?;
    scope.update_building_name(value)?;
    println!("Building name: {value}");
    Ok(())
}

pub fn item_add(description: &str, value: f64, quantity: u32, unit: &str) -> Result<()> {
    let mut scope = open_scope()?;
    let id = scope.add_expense_item(description, value, quantity, unit)?;
    println!("Budget item #{id}: {description}");
    Ok(())
}

pub fn item_edit(id: u32, patch: ExpenseItemUpdate) -> Result<()> {
    let mut scope = open_scope()?;
    scope.update_expense_item(id, patch)?;
    println!("Updated budget item #{id}");
    Ok(())
}

pub fn item_remove(id: u32) -> Result<()> {
    let mut scope = open_scope()?;
    scope.remove_expense_item(id)?;
    println!("Removed budget item #{id}");
    Ok(())
}

pub fn items() -> Result<()> {
    let scope = open_scope()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Description", "Amount", "Qty", "Unit", "Per unit"]);
    for item in &scope.state.expense_items {
        let per_unit = if item.quantity == 0 { 0.0 } else { item.amount / f64::from(item.quantity) };
        table.add_row(vec![
            Cell::new(item.id),
            Cell::new(&item.description),
            Cell::new(amount(item.amount)),
            Cell::new(item.quantity),
            Cell::new(&item.unit),
            Cell::new(amount(per_unit)),
        ]);
    }
    println!("{table}");
    println!(
        "Suggested monthly dues: {}",
        money(suggested_monthly_dues(&scope.state.expense_items))
    );
    Ok(())
}
