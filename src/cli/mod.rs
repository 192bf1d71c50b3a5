pub mod apartments;
pub mod columns;
pub mod dues;
pub mod export;
pub mod fees;
pub mod init;
pub mod ledger;
pub mod log;
pub mod resident;
pub mod staff;
pub mod status;
pub mod summary;
pub mod year;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Confirm;

use crate::cache::Cache;
use crate::db::{get_connection, init_db, DB_FILE};
use crate::error::{AidatError, Result};
use crate::fmt::money;
use crate::month::Month;
use crate::scope::Scope;
use crate::session::Session;
use crate::settings::load_settings;
use crate::store::SqliteStore;

fn db_path() -> Result<PathBuf> {
    let settings = load_settings();
    let path = PathBuf::from(&settings.data_dir).join(DB_FILE);
    if !path.exists() {
        return Err(AidatError::Settings(
            "database not found. Run `aidat init` to set up.".into(),
        ));
    }
    Ok(path)
}

fn open_as(session: Session) -> Result<Scope> {
    let settings = load_settings();
    let path = db_path()?;
    let store_conn = get_connection(&path)?;
    init_db(&store_conn)?;
    let cache = Cache::new(get_connection(&path)?, &session.building_id);
    Scope::open(
        Box::new(SqliteStore::new(store_conn)),
        cache,
        session,
        settings.default_policy(),
    )
}

/// Admin scope for the configured building and user.
pub(crate) fn open_scope() -> Result<Scope> {
    let settings = load_settings();
    open_as(Session::admin(&settings.user_name, &settings.building_id))
}

pub(crate) fn open_resident_scope() -> Result<Scope> {
    let settings = load_settings();
    open_as(Session::resident(&settings.building_id))
}

pub(crate) fn parse_month(raw: &str) -> Result<Month> {
    raw.parse()
}

pub(crate) fn month_or_current(raw: Option<&str>) -> Result<Month> {
    raw.map(parse_month).unwrap_or_else(|| Ok(Month::current()))
}

/// Ask before a destructive step; `--yes` skips the prompt.
pub(crate) fn confirm(prompt: &str, yes: bool) -> bool {
    if yes {
        return true;
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Balance cell colouring: debt red, credit green.
pub(crate) fn colored_balance(value: f64) -> String {
    if value > 0.005 {
        money(value).red().to_string()
    } else if value < -0.005 {
        money(value).green().to_string()
    } else {
        money(value)
    }
}

#[derive(Parser)]
#[command(name = "aidat", about = "Dues, ledger and payroll bookkeeping for apartment buildings.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up aidat: choose a data directory and initialize the database.
    Init {
        /// Path for aidat data (default: ~/Documents/aidat)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Building identifier; all data is kept per building
        #[arg(long)]
        building: Option<String>,
        /// Name recorded in the activity log
        #[arg(long)]
        user: Option<String>,
    },
    /// Show the active building, year and totals.
    Status,
    /// Manage the apartment registry.
    Apartments {
        #[command(subcommand)]
        command: ApartmentsCommands,
    },
    /// Record and review dues payments.
    Dues {
        #[command(subcommand)]
        command: DuesCommands,
    },
    /// Manage extra-fee columns on the dues schedule.
    Columns {
        #[command(subcommand)]
        command: ColumnsCommands,
    },
    /// Operating ledger: manual income and expense rows.
    Ledger {
        #[command(subcommand)]
        command: LedgerCommands,
    },
    /// Staff payroll.
    Staff {
        #[command(subcommand)]
        command: StaffCommands,
    },
    /// Monthly summary (icmal).
    Summary {
        #[command(subcommand)]
        command: Option<SummaryCommands>,
    },
    /// Fee policy, budget items and building name.
    Fees {
        #[command(subcommand)]
        command: FeesCommands,
    },
    /// Year rollover and archives.
    Year {
        #[command(subcommand)]
        command: YearCommands,
    },
    /// Resident statement for an access code.
    Resident {
        /// Six-character access code
        code: String,
        /// Month to report up to (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Export a table as CSV (Excel compatible).
    Export {
        /// dues | ledger | icmal | staff
        kind: String,
        /// Month for the ledger export
        #[arg(long)]
        month: Option<String>,
        /// Output path (default: <data_dir>/exports/<kind>-<date>.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show the activity log.
    Log {
        /// Number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum ApartmentsCommands {
    /// Add an apartment.
    Add {
        /// Resident name
        resident: String,
        /// Apartment number (default: next free number)
        #[arg(long)]
        number: Option<u32>,
        /// Owner name (default: resident)
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        owner_phone: Option<String>,
        #[arg(long)]
        resident_phone: Option<String>,
        #[arg(long)]
        block: Option<String>,
        /// Pays the annual elevator fee
        #[arg(long)]
        elevator: bool,
        /// Building manager (exempt from dues)
        #[arg(long)]
        manager: bool,
        /// Resident access code (default: generated)
        #[arg(long)]
        code: Option<String>,
    },
    /// List apartments.
    List,
    /// Edit an apartment.
    Edit {
        number: u32,
        #[arg(long)]
        resident: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        owner_phone: Option<String>,
        #[arg(long)]
        resident_phone: Option<String>,
        #[arg(long)]
        block: Option<String>,
        #[arg(long)]
        elevator: Option<bool>,
        #[arg(long)]
        manager: Option<bool>,
    },
    /// Delete an apartment and its dues.
    Delete {
        number: u32,
        #[arg(long)]
        yes: bool,
    },
    /// Issue a new resident access code.
    Code { number: u32 },
}

#[derive(Subcommand)]
pub enum DuesCommands {
    /// Set one month's dues payment (overwrites).
    Pay {
        apartment: u32,
        month: String,
        amount: f64,
    },
    /// Set an extra-fee amount (overwrites).
    Extra {
        apartment: u32,
        column: String,
        amount: f64,
    },
    /// Set the elevator fee paid this year (overwrites).
    Elevator { apartment: u32, amount: f64 },
    /// Show the dues schedule with balances as of a month.
    List {
        /// Month to accrue through (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ColumnsCommands {
    Add { name: String },
    Remove {
        name: String,
        #[arg(long)]
        yes: bool,
    },
    List,
}

#[derive(Subcommand)]
pub enum LedgerCommands {
    /// Add an income (gelir) or expense (gider) row.
    Add {
        month: String,
        /// income | expense (gelir | gider)
        kind: String,
        amount: f64,
        description: String,
        #[arg(long)]
        category: Option<String>,
        /// Date as dd.mm.yyyy (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Apartment the row belongs to (required for dues payments)
        #[arg(long)]
        apartment: Option<u32>,
    },
    /// Delete a row by id.
    Delete {
        month: String,
        kind: String,
        id: u32,
        #[arg(long)]
        yes: bool,
    },
    /// List a month's rows.
    List {
        #[arg(long)]
        month: Option<String>,
    },
    /// Carry a month's net into the following month.
    Transfer { month: String },
    /// Print a receipt for a row.
    Receipt { month: String, kind: String, id: u32 },
    /// Show the category lists.
    Categories,
}

#[derive(Subcommand)]
pub enum StaffCommands {
    /// Update a month's payroll record.
    Set {
        month: String,
        #[arg(long)]
        salary: Option<f64>,
        #[arg(long)]
        overtime: Option<f64>,
        #[arg(long)]
        paid: Option<f64>,
        #[arg(long)]
        advance: Option<f64>,
        #[arg(long)]
        owed: Option<f64>,
        /// Total paid this month; also books the payroll expense
        #[arg(long)]
        total: Option<f64>,
    },
    /// Show the payroll table.
    List,
    /// Set the staff member's name and role.
    Info {
        name: String,
        #[arg(long, default_value = "Kapıcı")]
        role: String,
    },
}

#[derive(Subcommand)]
pub enum SummaryCommands {
    /// Override a summary cell: cash, bank, elevator, or the Devir income.
    Set {
        /// Month, or "devir" for the carry-forward row
        period: String,
        /// cash | bank | elevator | income
        field: String,
        value: f64,
    },
}

#[derive(Subcommand)]
pub enum FeesCommands {
    /// Set the monthly dues amount.
    Dues { amount: f64 },
    /// Set the annual elevator fee.
    Elevator { amount: f64 },
    /// Suggest monthly dues from the budget items.
    Suggest,
    /// Set the building name.
    Name { name: String },
    /// Manage budget items.
    Items {
        #[command(subcommand)]
        command: ItemsCommands,
    },
}

#[derive(Subcommand)]
pub enum ItemsCommands {
    Add {
        description: String,
        amount: f64,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        #[arg(long, default_value = "TL")]
        unit: String,
    },
    Edit {
        id: u32,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        quantity: Option<u32>,
        #[arg(long)]
        unit: Option<String>,
    },
    Remove { id: u32 },
    List,
}

#[derive(Subcommand)]
pub enum YearCommands {
    /// Close the active year and open the next.
    New {
        #[arg(long)]
        yes: bool,
    },
    /// Switch to an archived year.
    Switch { year: i32 },
    /// List known years.
    List,
}
