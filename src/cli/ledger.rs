use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{confirm, month_or_current, open_scope, parse_month};
use crate::error::{AidatError, Result};
use crate::export::Receipt;
use crate::fmt::money;
use crate::models::{EntryKind, NewEntry, EXPENSE_CATEGORIES, INCOME_CATEGORIES};
use crate::sync::reverse_target;

fn parse_kind(raw: &str) -> Result<EntryKind> {
    EntryKind::parse(raw)
        .ok_or_else(|| AidatError::Validation(format!("kind must be income or expense, got '{raw}'")))
}

pub struct AddArgs {
    pub month: String,
    pub kind: String,
    pub amount: f64,
    pub description: String,
    pub category: Option<String>,
    pub date: Option<String>,
    pub apartment: Option<u32>,
}

pub fn add(args: AddArgs) -> Result<()> {
    let month = parse_month(&args.month)?;
    let kind = parse_kind(&args.kind)?;
    let mut scope = open_scope()?;
    scope.add_entry(
        month,
        kind,
        NewEntry {
            date: args.date.unwrap_or_default(),
            description: args.description,
            category: args.category.unwrap_or_else(|| "Diğer".to_string()),
            amount: args.amount,
            apartment: args.apartment,
        },
    )?;
    let totals = scope.month_totals(month);
    println!(
        "Added {} {} to {month} (net {})",
        kind.as_str(),
        money(args.amount),
        money(totals.net)
    );
    Ok(())
}

pub fn delete(month: &str, kind: &str, id: u32, yes: bool) -> Result<()> {
    let month = parse_month(month)?;
    let kind = parse_kind(kind)?;
    let mut scope = open_scope()?;
    let entry = scope
        .state
        .ledger
        .month(month)
        .list(kind)
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .ok_or_else(|| AidatError::NotFound(format!("{month} {} entry {id}", kind.as_str())))?;
    let mut prompt = format!("Delete '{}' ({})?", entry.description, money(entry.amount));
    if reverse_target(&entry).is_some() {
        prompt.push_str(" The dues payment will be set to zero.");
    }
    if !confirm(&prompt, yes) {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }
    scope.delete_entry(month, kind, id)?;
    println!("Deleted {month} {} #{id}", kind.as_str());
    Ok(())
}

pub fn list(month: Option<String>) -> Result<()> {
    let month = month_or_current(month.as_deref())?;
    let scope = open_scope()?;
    let data = scope.state.ledger.month(month);

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Category", "Amount"]);
    for (label, kind) in [("INCOME", EntryKind::Income), ("EXPENSES", EntryKind::Expense)] {
        let heading = match kind {
            EntryKind::Income => label.green().bold(),
            EntryKind::Expense => label.red().bold(),
        };
        table.add_row(vec![Cell::new(""), Cell::new(""), Cell::new(heading), Cell::new(""), Cell::new("")]);
        for e in data.list(kind) {
            table.add_row(vec![
                Cell::new(e.id),
                Cell::new(&e.date),
                Cell::new(&e.description),
                Cell::new(&e.category),
                Cell::new(money(e.amount)),
            ]);
        }
    }
    let totals = scope.month_totals(month);
    let net = if totals.net >= 0.0 {
        money(totals.net).green().to_string()
    } else {
        money(totals.net).red().to_string()
    };
    println!("Ledger {month} {}\n{table}", scope.state.year);
    println!("Income {}  Expense {}  Net {net}", money(totals.income), money(totals.expense));
    Ok(())
}

pub fn transfer(month: &str) -> Result<()> {
    let month = parse_month(month)?;
    let mut scope = open_scope()?;
    let entry = scope.transfer_net_difference(month)?;
    println!("{}", entry.description);
    Ok(())
}

pub fn receipt(month: &str, kind: &str, id: u32) -> Result<()> {
    let month = parse_month(month)?;
    let kind = parse_kind(kind)?;
    let scope = open_scope()?;
    let entry = scope
        .state
        .ledger
        .month(month)
        .list(kind)
        .iter()
        .find(|e| e.id == id)
        .ok_or_else(|| AidatError::NotFound(format!("{month} {} entry {id}", kind.as_str())))?;
    let r = Receipt::from_entry(entry, &scope.state.building_name);

    println!("{}", r.title().bold());
    if !r.building_name.is_empty() {
        println!("{}", r.building_name);
    }
    println!("  Seri:        {}", r.series());
    println!("  Tarih:       {}", r.date);
    println!("  Kimden/Kime: {}", r.counterparty);
    println!("  Açıklama:    {}", r.description);
    println!("  Tutar:       {}", money(r.amount));
    println!("  Yazıyla:     # {} #", r.amount_in_words);
    Ok(())
}

pub fn categories() -> Result<()> {
    println!("{}", "Income".green().bold());
    for c in INCOME_CATEGORIES {
        println!("  {c}");
    }
    println!("{}", "Expense".red().bold());
    for c in EXPENSE_CATEGORIES {
        println!("  {c}");
    }
    Ok(())
}
