use crate::cli::open_scope;
use crate::error::Result;
use crate::fmt::money;
use crate::models::EntryKind;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    println!("Data dir:   {}", settings.data_dir);

    let scope = open_scope()?;
    let key = scope.key();
    let s = &scope.state;
    println!("User:       {}", scope.session().user);
    println!("Building:   {}", key.building_id);
    let debt: f64 = s.dues.iter().map(|d| d.balance.max(0.0)).sum();

    println!("Name:       {}", if s.building_name.is_empty() { "(not set)" } else { &s.building_name });
    println!("Year:       {}", key.year);
    println!();
    println!("Apartments:      {}", s.apartments.len());
    println!("Monthly dues:    {}", money(s.policy.monthly_dues));
    println!("Elevator fee:    {}", money(s.policy.annual_elevator_fee));
    println!("Ledger income:   {}", money(s.ledger.total(EntryKind::Income)));
    println!("Ledger expense:  {}", money(s.ledger.total(EntryKind::Expense)));
    println!("Outstanding:     {}", money(debt));
    Ok(())
}
