use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::audit::{self, AuditAction};
use crate::balance;
use crate::cache::{Cache, Slice};
use crate::error::{AidatError, Result};
use crate::fees;
use crate::fmt::today;
use crate::models::{
    default_staff_records, default_summary, Apartment, DuesRow, ExpenseItem, FeePolicy, LogEntry,
    OperatingLedger, StaffRecord, SummaryRow,
};
use crate::month::Month;
use crate::session::Session;
use crate::store::Store;
use crate::summary::recompute_summary;
use crate::sync::sync_dues_to_ledger;

/// Which year of which building is active.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub building_id: String,
    pub year: i32,
}

/// Everything captured when a year is archived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearData {
    pub dues: Vec<DuesRow>,
    pub ledger: OperatingLedger,
    pub monthly_summary: Vec<SummaryRow>,
    pub staff_records: Vec<StaffRecord>,
    pub apartments: Vec<Apartment>,
    pub extra_fee_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub year: i32,
    pub apartments: Vec<Apartment>,
    pub dues: Vec<DuesRow>,
    pub ledger: OperatingLedger,
    pub summary: Vec<SummaryRow>,
    pub staff: Vec<StaffRecord>,
    pub extra_fee_columns: Vec<String>,
    pub policy: FeePolicy,
    pub building_name: String,
    pub staff_name: String,
    pub staff_role: String,
    pub expense_items: Vec<ExpenseItem>,
    pub audit_log: Vec<LogEntry>,
    pub available_years: Vec<i32>,
}

impl State {
    pub fn fresh(year: i32, policy: FeePolicy) -> Self {
        Self {
            year,
            apartments: Vec::new(),
            dues: Vec::new(),
            ledger: OperatingLedger::default(),
            summary: default_summary(),
            staff: default_staff_records(),
            extra_fee_columns: Vec::new(),
            policy,
            building_name: String::new(),
            staff_name: String::new(),
            staff_role: "Kapıcı".to_string(),
            expense_items: fees::default_expense_items(),
            audit_log: Vec::new(),
            available_years: vec![year],
        }
    }

    pub fn apartment(&self, number: u32) -> Option<&Apartment> {
        self.apartments.iter().find(|a| a.number == number)
    }

    pub fn dues_row(&self, number: u32) -> Option<&DuesRow> {
        self.dues.iter().find(|d| d.apartment == number)
    }

    pub fn snapshot(&self) -> YearData {
        YearData {
            dues: self.dues.clone(),
            ledger: self.ledger.clone(),
            monthly_summary: self.summary.clone(),
            staff_records: self.staff.clone(),
            apartments: self.apartments.clone(),
            extra_fee_columns: self.extra_fee_columns.clone(),
        }
    }

    /// Every apartment gets a dues row; rows for unknown apartments are kept
    /// so the sync can clean up their ledger rows.
    pub fn ensure_dues_rows(&mut self) {
        for apt in &self.apartments {
            if !self.dues.iter().any(|d| d.apartment == apt.number) {
                self.dues.push(DuesRow::new(apt.number, &apt.resident_name));
            }
        }
        self.dues.sort_by_key(|d| d.apartment);
    }

    pub fn recompute_all_totals(&mut self) {
        let policy = self.policy;
        for row in &mut self.dues {
            if let Some(apt) = self.apartments.iter().find(|a| a.number == row.apartment) {
                balance::apply_totals(apt, row, &policy);
            }
        }
    }

    /// Forward dues sync followed by a summary recompute.
    pub fn resync(&mut self) -> bool {
        let synced = sync_dues_to_ledger(&mut self.ledger, &self.dues, &self.apartments, &today());
        let summarized = recompute_summary(&mut self.summary, &self.ledger);
        synced || summarized
    }

    pub fn register_year(&mut self, year: i32) {
        if !self.available_years.contains(&year) {
            self.available_years.push(year);
        }
        self.available_years.sort_unstable();
    }

    /// Fill months missing from `fetched` with empty records.
    fn merge_staff(&mut self, fetched: Vec<StaffRecord>) {
        let mut records = default_staff_records();
        for rec in fetched {
            let i = rec.month.index();
            records[i] = rec;
        }
        self.staff = records;
    }
}

/// The active (building, year) scope: in-memory state plus the store and
/// cache that back it.
pub struct Scope {
    pub state: State,
    pub(crate) store: Box<dyn Store>,
    pub(crate) cache: Cache,
    pub(crate) session: Session,
}

/// Log a failed remote write and carry on. Local state is never rolled back.
pub(crate) fn best_effort(op: &str, result: Result<()>) {
    if let Err(e) = result {
        tracing::warn!(op, error = %e, "remote write failed");
    }
}

fn cached_or<T: serde::de::DeserializeOwned>(cache: &Cache, slice: Slice, default: T) -> Result<T> {
    Ok(cache.get(slice)?.unwrap_or(default))
}

impl Scope {
    /// Build the scope for the session's building. Cached slices are read
    /// first, then each non-empty remote fetch overrides its slice.
    pub fn open(store: Box<dyn Store>, cache: Cache, session: Session, defaults: FeePolicy) -> Result<Self> {
        let building = session.building_id.clone();
        let year = cache
            .get::<i32>(Slice::Year)?
            .unwrap_or_else(|| chrono::Local::now().year());

        let base = State::fresh(year, defaults);
        let mut state = State {
            year,
            apartments: cached_or(&cache, Slice::Apartments, base.apartments)?,
            dues: cached_or(&cache, Slice::Dues, base.dues)?,
            ledger: cached_or(&cache, Slice::Ledger, base.ledger)?,
            summary: cached_or(&cache, Slice::MonthlySummary, base.summary)?,
            staff: cached_or(&cache, Slice::StaffRecords, base.staff)?,
            extra_fee_columns: cached_or(&cache, Slice::ExtraFeeColumns, base.extra_fee_columns)?,
            policy: FeePolicy {
                monthly_dues: cached_or(&cache, Slice::MonthlyDuesAmount, defaults.monthly_dues)?,
                annual_elevator_fee: cached_or(&cache, Slice::AnnualElevatorFee, defaults.annual_elevator_fee)?,
            },
            building_name: cached_or(&cache, Slice::ApartmentName, base.building_name)?,
            staff_name: cached_or(&cache, Slice::StaffName, base.staff_name)?,
            staff_role: cached_or(&cache, Slice::StaffRole, base.staff_role)?,
            expense_items: cached_or(&cache, Slice::ExpenseItems, base.expense_items)?,
            audit_log: cached_or(&cache, Slice::AuditLog, base.audit_log)?,
            available_years: cached_or(&cache, Slice::AvailableYears, base.available_years)?,
        };

        let cached_staff = std::mem::take(&mut state.staff);
        state.merge_staff(cached_staff);

        match store.fetch_apartments(&building) {
            Ok(rows) if !rows.is_empty() => state.apartments = rows,
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "fetch apartments failed, using cache"),
        }
        match store.fetch_dues_for_year(&building, year) {
            Ok(rows) if !rows.is_empty() => state.dues = rows,
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "fetch dues failed, using cache"),
        }
        match store.fetch_extra_fee_columns(&building) {
            Ok(cols) if !cols.is_empty() => state.extra_fee_columns = cols,
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "fetch extra fee columns failed, using cache"),
        }
        match store.fetch_staff_records(&building, year) {
            Ok(recs) if !recs.is_empty() => state.merge_staff(recs),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "fetch staff records failed, using cache"),
        }
        for month in Month::ALL {
            match store.fetch_operating_ledger(&building, year, month) {
                Ok(data) if !data.income.is_empty() || !data.expense.is_empty() => {
                    state.ledger.set_month(month, data)
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(%month, error = %e, "fetch ledger failed, using cache"),
            }
        }
        match store.fetch_audit_log(&building) {
            Ok(entries) if !entries.is_empty() => state.audit_log = entries,
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "fetch audit log failed, using cache"),
        }

        state.register_year(year);
        state.ensure_dues_rows();
        state.recompute_all_totals();
        state.resync();

        let scope = Self { state, store, cache, session };
        scope.save_all()?;
        tracing::debug!(building = %building, year, "scope loaded");
        Ok(scope)
    }

    pub fn key(&self) -> ScopeKey {
        ScopeKey {
            building_id: self.session.building_id.clone(),
            year: self.state.year,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn building(&self) -> &str {
        &self.session.building_id
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.session.is_admin() {
            Ok(())
        } else {
            Err(AidatError::Forbidden("this action needs an admin session".into()))
        }
    }

    pub(crate) fn require_apartment(&self, number: u32) -> Result<&Apartment> {
        self.state.apartment(number).ok_or(AidatError::UnknownApartment(number))
    }

    pub(crate) fn audit(&mut self, action: AuditAction, details: &str) -> Result<()> {
        let entry = audit::new_entry(&self.state.audit_log, action, details, &self.session.user);
        best_effort(
            "append_audit_log_entry",
            self.store.append_audit_log_entry(&self.session.building_id, &entry),
        );
        self.state.audit_log.insert(0, entry);
        self.cache.put(Slice::AuditLog, &self.state.audit_log)
    }

    /// Cascade after anything that touches dues or the registry.
    pub(crate) fn after_dues_change(&mut self) -> Result<()> {
        self.state.resync();
        self.cache.put(Slice::Dues, &self.state.dues)?;
        self.cache.put(Slice::Ledger, &self.state.ledger)?;
        self.cache.put(Slice::MonthlySummary, &self.state.summary)
    }

    pub(crate) fn after_ledger_change(&mut self) -> Result<()> {
        recompute_summary(&mut self.state.summary, &self.state.ledger);
        self.cache.put(Slice::Ledger, &self.state.ledger)?;
        self.cache.put(Slice::MonthlySummary, &self.state.summary)
    }

    pub(crate) fn save_all(&self) -> Result<()> {
        let s = &self.state;
        self.cache.put(Slice::Year, &s.year)?;
        self.cache.put(Slice::Apartments, &s.apartments)?;
        self.cache.put(Slice::Dues, &s.dues)?;
        self.cache.put(Slice::Ledger, &s.ledger)?;
        self.cache.put(Slice::MonthlySummary, &s.summary)?;
        self.cache.put(Slice::StaffRecords, &s.staff)?;
        self.cache.put(Slice::ExtraFeeColumns, &s.extra_fee_columns)?;
        self.cache.put(Slice::MonthlyDuesAmount, &s.policy.monthly_dues)?;
        self.cache.put(Slice::AnnualElevatorFee, &s.policy.annual_elevator_fee)?;
        self.cache.put(Slice::ApartmentName, &s.building_name)?;
        self.cache.put(Slice::StaffName, &s.staff_name)?;
        self.cache.put(Slice::StaffRole, &s.staff_role)?;
        self.cache.put(Slice::ExpenseItems, &s.expense_items)?;
        self.cache.put(Slice::AuditLog, &s.audit_log)?;
        self.cache.put(Slice::AvailableYears, &s.available_years)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::db::{reopen, test_db};
    use crate::store::SqliteStore;

    pub fn policy() -> FeePolicy {
        FeePolicy { monthly_dues: 750.0, annual_elevator_fee: 600.0 }
    }

    /// Admin scope over a fresh temp database.
    pub fn scope() -> (tempfile::TempDir, Scope) {
        let (dir, conn) = test_db();
        let scope = open_in(&dir, conn, Session::admin("Yönetici", "b1"));
        (dir, scope)
    }

    pub fn open_in(dir: &tempfile::TempDir, store_conn: rusqlite::Connection, session: Session) -> Scope {
        let cache = Cache::new(reopen(dir), &session.building_id);
        Scope::open(Box::new(SqliteStore::new(store_conn)), cache, session, policy()).unwrap()
    }

    pub fn add(scope: &mut Scope, number: u32, name: &str) {
        scope
            .add_apartment(crate::registry::NewApartment {
                number: Some(number),
                resident_name: name.into(),
                owner_name: name.into(),
                elevator_liable: true,
                ..Default::default()
            })
            .unwrap();
    }

    /// Store whose every call fails.
    pub struct DownStore;

    fn down<T>() -> Result<T> {
        Err(AidatError::Store("unreachable".into()))
    }

    impl Store for DownStore {
        fn fetch_apartments(&self, _: &str) -> Result<Vec<Apartment>> { down() }
        fn fetch_dues_for_year(&self, _: &str, _: i32) -> Result<Vec<DuesRow>> { down() }
        fn fetch_extra_fee_columns(&self, _: &str) -> Result<Vec<String>> { down() }
        fn fetch_staff_records(&self, _: &str, _: i32) -> Result<Vec<StaffRecord>> { down() }
        fn fetch_operating_ledger(&self, _: &str, _: i32, _: Month) -> Result<crate::models::MonthLedger> { down() }
        fn fetch_audit_log(&self, _: &str) -> Result<Vec<LogEntry>> { down() }
        fn save_dues_payment(&self, _: &str, _: i32, _: u32, _: Month, _: f64) -> Result<()> { down() }
        fn save_extra_fee(&self, _: &str, _: i32, _: u32, _: &str, _: f64) -> Result<()> { down() }
        fn save_elevator_payment(&self, _: &str, _: i32, _: u32, _: f64) -> Result<()> { down() }
        fn save_opening_balance(&self, _: &str, _: i32, _: &DuesRow) -> Result<()> { down() }
        fn create_apartment(&self, _: &str, _: &Apartment) -> Result<()> { down() }
        fn update_apartment(&self, _: &str, _: &Apartment) -> Result<()> { down() }
        fn delete_apartment(&self, _: &str, _: u32) -> Result<()> { down() }
        fn create_ledger_entry(&self, _: &str, _: i32, _: Month, _: &crate::models::LedgerEntry) -> Result<()> { down() }
        fn delete_ledger_entry(&self, _: &str, _: i32, _: Month, _: crate::models::EntryKind, _: u32) -> Result<()> { down() }
        fn upsert_staff_record(&self, _: &str, _: i32, _: &StaffRecord) -> Result<()> { down() }
        fn create_extra_fee_column(&self, _: &str, _: &str) -> Result<()> { down() }
        fn delete_extra_fee_column(&self, _: &str, _: &str) -> Result<()> { down() }
        fn append_audit_log_entry(&self, _: &str, _: &LogEntry) -> Result<()> { down() }
    }
}
