use colored::Colorize;

use crate::cli::{confirm, open_scope};
use crate::error::Result;

pub fn add(name: &str) -> Result<()> {
    let mut scope = open_scope()?;
    scope.add_extra_fee_column(name)?;
    println!("Fee column: {}", name.trim());
    Ok(())
}

pub fn remove(name: &str, yes: bool) -> Result<()> {
    let mut scope = open_scope()?;
    if !confirm(&format!("Remove fee column '{name}'? Recorded amounts are kept."), yes) {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }
    scope.remove_extra_fee_column(name)?;
    println!("Removed fee column {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let scope = open_scope()?;
    if scope.state.extra_fee_columns.is_empty() {
        println!("No extra fee columns.");
    }
    for name in &scope.state.extra_fee_columns {
        println!("  {name}");
    }
    Ok(())
}
