use std::path::PathBuf;

use crate::cli::{month_or_current, open_scope};
use crate::error::{AidatError, Result};
use crate::export::{dues_table, icmal_table, ledger_table, staff_table, write_csv_file};
use crate::settings::{get_data_dir, shellexpand_path};

fn default_path(kind: &str) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    get_data_dir().join("exports").join(format!("{kind}-{date}.csv"))
}

pub fn run(kind: &str, month: Option<String>, output: Option<String>) -> Result<()> {
    let scope = open_scope()?;
    let state = &scope.state;
    let kind = kind.trim().to_lowercase();
    let table = match kind.as_str() {
        "dues" | "aidat" => dues_table(state),
        "ledger" | "defter" => ledger_table(state, month_or_current(month.as_deref())?),
        "icmal" | "summary" => icmal_table(state, &scope.icmal()),
        "staff" | "kapici" => staff_table(state),
        other => {
            return Err(AidatError::Validation(format!(
                "unknown export '{other}'; use dues, ledger, icmal or staff"
            )))
        }
    };
    let path = output
        .map(|p| PathBuf::from(shellexpand_path(&p)))
        .unwrap_or_else(|| default_path(&kind));
    write_csv_file(&table, &path)?;
    tracing::info!(kind = %kind, path = %path.display(), "export written");
    println!("Wrote {}", path.display());
    Ok(())
}
