mod audit;
mod balance;
mod cache;
mod cli;
mod db;
mod dues;
mod error;
mod export;
mod fees;
mod fmt;
mod ledger;
mod models;
mod month;
mod registry;
mod resident;
mod rollover;
mod scope;
mod session;
mod settings;
mod staff;
mod store;
mod summary;
mod sync;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{
    ApartmentsCommands, Cli, ColumnsCommands, Commands, DuesCommands, FeesCommands, ItemsCommands,
    LedgerCommands, StaffCommands, SummaryCommands, YearCommands,
};
use fees::ExpenseItemUpdate;
use models::{ApartmentUpdate, StaffUpdate};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aidat=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir, building, user } => cli::init::run(data_dir, building, user),
        Commands::Status => cli::status::run(),
        Commands::Apartments { command } => match command {
            ApartmentsCommands::Add {
                resident,
                number,
                owner,
                owner_phone,
                resident_phone,
                block,
                elevator,
                manager,
                code,
            } => cli::apartments::add(cli::apartments::AddArgs {
                resident,
                number,
                owner,
                owner_phone,
                resident_phone,
                block,
                elevator,
                manager,
                code,
            }),
            ApartmentsCommands::List => cli::apartments::list(),
            ApartmentsCommands::Edit {
                number,
                resident,
                owner,
                owner_phone,
                resident_phone,
                block,
                elevator,
                manager,
            } => cli::apartments::edit(
                number,
                ApartmentUpdate {
                    resident_name: resident,
                    owner_name: owner,
                    owner_phone,
                    resident_phone,
                    elevator_liable: elevator,
                    is_manager: manager,
                    block,
                },
            ),
            ApartmentsCommands::Delete { number, yes } => cli::apartments::delete(number, yes),
            ApartmentsCommands::Code { number } => cli::apartments::code(number),
        },
        Commands::Dues { command } => match command {
            DuesCommands::Pay { apartment, month, amount } => {
                cli::dues::pay(apartment, &month, amount)
            }
            DuesCommands::Extra { apartment, column, amount } => {
                cli::dues::extra(apartment, &column, amount)
            }
            DuesCommands::Elevator { apartment, amount } => cli::dues::elevator(apartment, amount),
            DuesCommands::List { month } => cli::dues::list(month),
        },
        Commands::Columns { command } => match command {
            ColumnsCommands::Add { name } => cli::columns::add(&name),
            ColumnsCommands::Remove { name, yes } => cli::columns::remove(&name, yes),
            ColumnsCommands::List => cli::columns::list(),
        },
        Commands::Ledger { command } => match command {
            LedgerCommands::Add {
                month,
                kind,
                amount,
                description,
                category,
                date,
                apartment,
            } => cli::ledger::add(cli::ledger::AddArgs {
                month,
                kind,
                amount,
                description,
                category,
                date,
                apartment,
            }),
            LedgerCommands::Delete { month, kind, id, yes } => {
                cli::ledger::delete(&month, &kind, id, yes)
            }
            LedgerCommands::List { month } => cli::ledger::list(month),
            LedgerCommands::Transfer { month } => cli::ledger::transfer(&month),
            LedgerCommands::Receipt { month, kind, id } => cli::ledger::receipt(&month, &kind, id),
            LedgerCommands::Categories => cli::ledger::categories(),
        },
        Commands::Staff { command } => match command {
            StaffCommands::Set {
                month,
                salary,
                overtime,
                paid,
                advance,
                owed,
                total,
            } => cli::staff::set(
                &month,
                StaffUpdate {
                    salary,
                    overtime,
                    paid,
                    advance,
                    owed,
                    total_paid: total,
                },
            ),
            StaffCommands::List => cli::staff::list(),
            StaffCommands::Info { name, role } => cli::staff::info(&name, &role),
        },
        Commands::Summary { command } => match command {
            None => cli::summary::show(),
            Some(SummaryCommands::Set { period, field, value }) => {
                cli::summary::set(&period, &field, value)
            }
        },
        Commands::Fees { command } => match command {
            FeesCommands::Dues { amount } => cli::fees::dues(amount),
            FeesCommands::Elevator { amount } => cli::fees::elevator(amount),
            FeesCommands::Suggest => cli::fees::suggest(),
            FeesCommands::Name { name } => cli::fees::name(&name),
            FeesCommands::Items { command } => match command {
                ItemsCommands::Add {
                    description,
                    amount,
                    quantity,
                    unit,
                } => cli::fees::item_add(&description, amount, quantity, &unit),
                ItemsCommands::Edit {
                    id,
                    description,
                    amount,
                    quantity,
                    unit,
                } => cli::fees::item_edit(
                    id,
                    ExpenseItemUpdate {
                        description,
                        amount,
                        quantity,
                        unit,
                    },
                ),
                ItemsCommands::Remove { id } => cli::fees::item_remove(id),
                ItemsCommands::List => cli::fees::items(),
            },
        },
        Commands::Year { command } => match command {
            YearCommands::New { yes } => cli::year::new_year(yes),
            YearCommands::Switch { year } => cli::year::switch(year),
            YearCommands::List => cli::year::list(),
        },
        Commands::Resident { code, month } => cli::resident::run(&code, month),
        Commands::Export { kind, month, output } => cli::export::run(&kind, month, output),
        Commands::Log { limit } => cli::log::run(limit),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
