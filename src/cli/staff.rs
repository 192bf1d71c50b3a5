use comfy_table::{Cell, Table};

use crate::cli::{open_scope, parse_month};
use crate::error::Result;
use crate::fmt::{amount, money};
use crate::models::StaffUpdate;

pub fn set(month: &str, patch: StaffUpdate) -> Result<()> {
    let month = parse_month(month)?;
    let mut scope = open_scope()?;
    scope.update_staff_record(month, patch)?;
    println!("Updated payroll for {month}");
    Ok(())
}

pub fn list() -> Result<()> {
    let scope = open_scope()?;
    let s = &scope.state;
    let mut table = Table::new();
    table.set_header(vec!["Month", "Salary", "Overtime", "Paid", "Advance", "Owed", "Total paid"]);
    for r in &s.staff {
        table.add_row(vec![
            Cell::new(r.month),
            Cell::new(amount(r.salary)),
            Cell::new(amount(r.overtime)),
            Cell::new(amount(r.paid)),
            Cell::new(amount(r.advance)),
            Cell::new(amount(r.owed)),
            Cell::new(amount(r.total_paid)),
        ]);
    }
    let who = if s.staff_name.is_empty() { "(not set)" } else { s.staff_name.as_str() };
    println!("{} - {who}\n{table}", s.staff_role);
    println!("Year total: {}", money(scope.staff_total_paid()));
    Ok(())
}

pub fn info(name: &str, role: &str) -> Result<()> {
    let mut scope = open_scope()?;
    scope.update_staff_info(name, role)?;
    println!("Staff: {name} ({role})");
    Ok(())
}
