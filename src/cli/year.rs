use colored::Colorize;

use crate::cli::{confirm, open_scope};
use crate::error::Result;

pub fn new_year(yes: bool) -> Result<()> {
    let mut scope = open_scope()?;
    let from = scope.state.year;
    let prompt = format!(
        "Close {from} and open {}? Balances carry over and payments are reset.",
        from + 1
    );
    if !confirm(&prompt, yes) {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }
    let year = scope.start_new_year()?;
    println!("{} {from} archived, {year} is now active.", "Done.".green());
    Ok(())
}

pub fn switch(year: i32) -> Result<()> {
    let mut scope = open_scope()?;
    scope.switch_year(year)?;
    println!("Active year: {year}");
    Ok(())
}

pub fn list() -> Result<()> {
    let scope = open_scope()?;
    let archived = scope.archived_years()?;
    for &year in scope.available_years() {
        if year == scope.state.year {
            println!("  {} (active)", year.to_string().bold());
        } else if archived.contains(&year) {
            println!("  {year}");
        } else {
            println!("  {year} {}", "(no archive)".dimmed());
        }
    }
    Ok(())
}
