use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{confirm, open_scope};
use crate::error::Result;
use crate::models::ApartmentUpdate;
use crate::registry::NewApartment;

pub struct AddArgs {
    pub resident: String,
    pub number: Option<u32>,
    pub owner: Option<String>,
    pub owner_phone: Option<String>,
    pub resident_phone: Option<String>,
    pub block: Option<String>,
    pub elevator: bool,
    pub manager: bool,
    pub code: Option<String>,
}

pub fn add(args: AddArgs) -> Result<()> {
    let mut scope = open_scope()?;
    let apt = scope.add_apartment(NewApartment {
        number: args.number,
        resident_name: args.resident,
        owner_name: args.owner.unwrap_or_default(),
        owner_phone: args.owner_phone,
        resident_phone: args.resident_phone,
        elevator_liable: args.elevator,
        is_manager: args.manager,
        block: args.block,
        access_code: args.code,
    })?;
    println!(
        "Added apartment {}: {} (access code {})",
        apt.number,
        apt.resident_name,
        apt.access_code.as_deref().unwrap_or("-").bold()
    );
    Ok(())
}

pub fn list() -> Result<()> {
    let scope = open_scope()?;
    let mut table = Table::new();
    table.set_header(vec!["No", "Block", "Resident", "Owner", "Phone", "Elevator", "Manager", "Code"]);
    for a in &scope.state.apartments {
        table.add_row(vec![
            Cell::new(a.number),
            Cell::new(a.block.clone().unwrap_or_default()),
            Cell::new(&a.resident_name),
            Cell::new(&a.owner_name),
            Cell::new(a.resident_phone.clone().or_else(|| a.owner_phone.clone()).unwrap_or_default()),
            Cell::new(if a.elevator_liable { "yes" } else { "" }),
            Cell::new(if a.is_manager { "yes" } else { "" }),
            Cell::new(a.access_code.clone().unwrap_or_default()),
        ]);
    }
    println!("Apartments\n{table}");
    Ok(())
}

pub fn edit(number: u32, patch: ApartmentUpdate) -> Result<()> {
    let mut scope = open_scope()?;
    scope.update_apartment(number, patch)?;
    println!("Updated apartment {number}");
    Ok(())
}

pub fn delete(number: u32, yes: bool) -> Result<()> {
    let mut scope = open_scope()?;
    let name = scope.require_apartment(number)?.resident_name.clone();
    if !confirm(&format!("Delete apartment {number} ({name}) and its dues?"), yes) {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }
    scope.delete_apartment(number)?;
    println!("Deleted apartment {number}");
    Ok(())
}

pub fn code(number: u32) -> Result<()> {
    let mut scope = open_scope()?;
    let code = scope.regenerate_access_code(number)?;
    println!("New access code for apartment {number}: {}", code.bold());
    Ok(())
}
