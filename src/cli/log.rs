use comfy_table::{Cell, Table};

use crate::cli::open_scope;
use crate::error::Result;

pub fn run(limit: usize) -> Result<()> {
    let scope = open_scope()?;
    let log = &scope.state.audit_log;
    if log.is_empty() {
        println!("No activity yet.");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["Date", "User", "Action", "Details"]);
    for e in log.iter().take(limit) {
        table.add_row(vec![
            Cell::new(&e.date),
            Cell::new(e.user.as_deref().unwrap_or("-")),
            Cell::new(&e.action),
            Cell::new(&e.details),
        ]);
    }
    println!("{table}");
    if log.len() > limit {
        println!("... {} more", log.len() - limit);
    }
    Ok(())
}
