use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{colored_balance, month_or_current, open_resident_scope};
use crate::error::Result;
use crate::fmt::money;
use crate::resident::resident_statement;

pub fn run(code: &str, month: Option<String>) -> Result<()> {
    let current = month_or_current(month.as_deref())?;
    let scope = open_resident_scope()?;
    let st = resident_statement(&scope.state, code, current)?;

    println!(
        "{} - Daire {} ({})",
        st.apartment.resident_name.bold(),
        st.apartment.number,
        st.year
    );

    let mut table = Table::new();
    table.set_header(vec!["Month", "Due", "Paid", ""]);
    for m in &st.months {
        let mark = if m.is_paid() { "✓".green() } else { "✗".red() };
        table.add_row(vec![
            Cell::new(m.month),
            Cell::new(money(m.due)),
            Cell::new(money(m.paid)),
            Cell::new(mark),
        ]);
    }
    println!("{table}");

    let b = &st.balance;
    println!("  Carried over:     {}", money(b.carried_over));
    println!("  Dues to date:     {}", money(b.accrued_dues));
    if b.expected_elevator > 0.0 {
        println!("  Elevator fee:     {}", money(b.expected_elevator));
    }
    if b.late_fee > 0.0 {
        println!("  Late fee:         {}", money(b.late_fee).red());
    }
    println!("  Paid:             {}", money(b.total_paid));
    println!("  Balance:          {}", colored_balance(b.balance));
    println!();
    println!(
        "  Building expenses {}; your share {}",
        money(st.total_expenses),
        money(st.expense_share)
    );
    if !st.current_month_paid {
        println!("{}", format!("{current} dues are not paid yet.").yellow());
    }
    if st.risk.at_risk {
        println!(
            "{}",
            format!("{} months unpaid in a row.", st.risk.max_consecutive_unpaid).red().bold()
        );
    }
    Ok(())
}
