use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{AidatError, Result};
use crate::models::{
    Apartment, DuesRow, EntryKind, EntrySource, LedgerEntry, LogEntry, MonthLedger, StaffRecord,
};
use crate::month::Month;

/// Remote persistence for one or more buildings. Reads are awaited on scope
/// load; writes are issued after the in-memory change and are allowed to
/// fail without rolling anything back.
pub trait Store {
    fn fetch_apartments(&self, building: &str) -> Result<Vec<Apartment>>;
    fn fetch_dues_for_year(&self, building: &str, year: i32) -> Result<Vec<DuesRow>>;
    fn fetch_extra_fee_columns(&self, building: &str) -> Result<Vec<String>>;
    fn fetch_staff_records(&self, building: &str, year: i32) -> Result<Vec<StaffRecord>>;
    fn fetch_operating_ledger(&self, building: &str, year: i32, month: Month) -> Result<MonthLedger>;
    fn fetch_audit_log(&self, building: &str) -> Result<Vec<LogEntry>>;

    fn save_dues_payment(&self, building: &str, year: i32, apartment: u32, month: Month, amount: f64) -> Result<()>;
    fn save_extra_fee(&self, building: &str, year: i32, apartment: u32, column: &str, amount: f64) -> Result<()>;
    fn save_elevator_payment(&self, building: &str, year: i32, apartment: u32, amount: f64) -> Result<()>;
    fn save_opening_balance(&self, building: &str, year: i32, row: &DuesRow) -> Result<()>;
    fn create_apartment(&self, building: &str, apartment: &Apartment) -> Result<()>;
    fn update_apartment(&self, building: &str, apartment: &Apartment) -> Result<()>;
    fn delete_apartment(&self, building: &str, number: u32) -> Result<()>;
    fn create_ledger_entry(&self, building: &str, year: i32, month: Month, entry: &LedgerEntry) -> Result<()>;
    fn delete_ledger_entry(&self, building: &str, year: i32, month: Month, kind: EntryKind, id: u32) -> Result<()>;
    fn upsert_staff_record(&self, building: &str, year: i32, record: &StaffRecord) -> Result<()>;
    fn create_extra_fee_column(&self, building: &str, name: &str) -> Result<()>;
    fn delete_extra_fee_column(&self, building: &str, name: &str) -> Result<()>;
    fn append_audit_log_entry(&self, building: &str, entry: &LogEntry) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    fn ensure_dues_row(&self, building: &str, year: i32, apartment: u32) -> Result<()> {
        let resident: Option<String> = self
            .conn
            .query_row(
                "SELECT resident_name FROM apartments WHERE building_id = ?1 AND number = ?2",
                params![building, apartment],
                |row| row.get(0),
            )
            .optional()?;
        self.conn.execute(
            "INSERT OR IGNORE INTO dues (building_id, year, apartment, resident_name) VALUES (?1, ?2, ?3, ?4)",
            params![building, year, apartment, resident.unwrap_or_default()],
        )?;
        Ok(())
    }
}

fn parse_month(raw: &str) -> rusqlite::Result<Month> {
    raw.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("bad month: {raw}").into(),
        )
    })
}

impl Store for SqliteStore {
    fn fetch_apartments(&self, building: &str) -> Result<Vec<Apartment>> {
        let mut stmt = self.conn.prepare(
            "SELECT number, resident_name, owner_name, owner_phone, resident_phone, \
             elevator_liable, is_manager, block, access_code \
             FROM apartments WHERE building_id = ?1 ORDER BY number",
        )?;
        let rows = stmt
            .query_map([building], |row| {
                Ok(Apartment {
                    number: row.get(0)?,
                    resident_name: row.get(1)?,
                    owner_name: row.get(2)?,
                    owner_phone: row.get(3)?,
                    resident_phone: row.get(4)?,
                    elevator_liable: row.get(5)?,
                    is_manager: row.get(6)?,
                    block: row.get(7)?,
                    access_code: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn fetch_dues_for_year(&self, building: &str, year: i32) -> Result<Vec<DuesRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT apartment, resident_name, carried_over, elevator_paid FROM dues \
             WHERE building_id = ?1 AND year = ?2 ORDER BY apartment",
        )?;
        let mut rows: Vec<DuesRow> = stmt
            .query_map(params![building, year], |row| {
                Ok(DuesRow {
                    apartment: row.get(0)?,
                    resident_name: row.get(1)?,
                    carried_over: row.get(2)?,
                    elevator_paid: row.get(3)?,
                    ..DuesRow::default()
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let index: HashMap<u32, usize> = rows.iter().enumerate().map(|(i, r)| (r.apartment, i)).collect();

        let mut pay_stmt = self.conn.prepare(
            "SELECT apartment, month, amount FROM dues_payments WHERE building_id = ?1 AND year = ?2",
        )?;
        let payments = pay_stmt
            .query_map(params![building, year], |row| {
                let month: String = row.get(1)?;
                Ok((row.get::<_, u32>(0)?, parse_month(&month)?, row.get::<_, f64>(2)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for (apt, month, amount) in payments {
            if let Some(&i) = index.get(&apt) {
                rows[i].monthly_payments.insert(month, amount);
            }
        }

        let mut fee_stmt = self.conn.prepare(
            "SELECT apartment, fee_name, amount FROM dues_extra_fees WHERE building_id = ?1 AND year = ?2",
        )?;
        let fees = fee_stmt
            .query_map(params![building, year], |row| {
                Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, f64>(2)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for (apt, name, amount) in fees {
            if let Some(&i) = index.get(&apt) {
                rows[i].extra_fees.insert(name, amount);
            }
        }
        Ok(rows)
    }

    fn fetch_extra_fee_columns(&self, building: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM extra_fee_columns WHERE building_id = ?1 ORDER BY created_at, rowid",
        )?;
        let names = stmt
            .query_map([building], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn fetch_staff_records(&self, building: &str, year: i32) -> Result<Vec<StaffRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT month, salary, overtime, paid, advance, owed, total_paid FROM staff_records \
             WHERE building_id = ?1 AND year = ?2",
        )?;
        let mut records = stmt
            .query_map(params![building, year], |row| {
                let month: String = row.get(0)?;
                Ok(StaffRecord {
                    month: parse_month(&month)?,
                    salary: row.get(1)?,
                    overtime: row.get(2)?,
                    paid: row.get(3)?,
                    advance: row.get(4)?,
                    owed: row.get(5)?,
                    total_paid: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        records.sort_by_key(|r| r.month);
        Ok(records)
    }

    fn fetch_operating_ledger(&self, building: &str, year: i32, month: Month) -> Result<MonthLedger> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, entry_id, date, description, category, amount, source_tag, apartment, resident_name \
             FROM ledger_entries WHERE building_id = ?1 AND year = ?2 AND month = ?3 \
             ORDER BY rowid",
        )?;
        let entries = stmt
            .query_map(params![building, year, month.name()], |row| {
                let kind: String = row.get(0)?;
                let tag: Option<String> = row.get(6)?;
                Ok(LedgerEntry {
                    id: row.get(1)?,
                    date: row.get(2)?,
                    description: row.get(3)?,
                    category: row.get(4)?,
                    amount: row.get(5)?,
                    kind: EntryKind::parse(&kind).unwrap_or(EntryKind::Expense),
                    source: tag.and_then(|t| EntrySource::from_tag(&t, month)),
                    apartment: row.get(7)?,
                    resident_name: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut data = MonthLedger::default();
        for entry in entries {
            data.list_mut(entry.kind).push(entry);
        }
        Ok(data)
    }

    fn fetch_audit_log(&self, building: &str) -> Result<Vec<LogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, action, details, user FROM audit_log \
             WHERE building_id = ?1 ORDER BY id DESC",
        )?;
        let entries = stmt
            .query_map([building], |row| {
                Ok(LogEntry {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    action: row.get(2)?,
                    details: row.get(3)?,
                    user: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn save_dues_payment(&self, building: &str, year: i32, apartment: u32, month: Month, amount: f64) -> Result<()> {
        self.ensure_dues_row(building, year, apartment)?;
        self.conn.execute(
            "INSERT INTO dues_payments (building_id, year, apartment, month, amount) VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(building_id, year, apartment, month) DO UPDATE SET amount = excluded.amount",
            params![building, year, apartment, month.name(), amount],
        )?;
        Ok(())
    }

    fn save_extra_fee(&self, building: &str, year: i32, apartment: u32, column: &str, amount: f64) -> Result<()> {
        self.ensure_dues_row(building, year, apartment)?;
        self.conn.execute(
            "INSERT INTO dues_extra_fees (building_id, year, apartment, fee_name, amount) VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(building_id, year, apartment, fee_name) DO UPDATE SET amount = excluded.amount",
            params![building, year, apartment, column, amount],
        )?;
        Ok(())
    }

    fn save_elevator_payment(&self, building: &str, year: i32, apartment: u32, amount: f64) -> Result<()> {
        self.ensure_dues_row(building, year, apartment)?;
        self.conn.execute(
            "UPDATE dues SET elevator_paid = ?4 WHERE building_id = ?1 AND year = ?2 AND apartment = ?3",
            params![building, year, apartment, amount],
        )?;
        Ok(())
    }

    fn save_opening_balance(&self, building: &str, year: i32, row: &DuesRow) -> Result<()> {
        self.conn.execute(
            "INSERT INTO dues (building_id, year, apartment, resident_name, carried_over, elevator_paid) \
             VALUES (?1, ?2, ?3, ?4, ?5, 0) \
             ON CONFLICT(building_id, year, apartment) DO UPDATE SET carried_over = excluded.carried_over",
            params![building, year, row.apartment, row.resident_name, row.carried_over],
        )?;
        Ok(())
    }

    fn create_apartment(&self, building: &str, apt: &Apartment) -> Result<()> {
        self.conn.execute(
            "INSERT INTO apartments (building_id, number, resident_name, owner_name, owner_phone, \
             resident_phone, elevator_liable, is_manager, block, access_code) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                building,
                apt.number,
                apt.resident_name,
                apt.owner_name,
                apt.owner_phone,
                apt.resident_phone,
                apt.elevator_liable,
                apt.is_manager,
                apt.block,
                apt.access_code,
            ],
        )?;
        Ok(())
    }

    fn update_apartment(&self, building: &str, apt: &Apartment) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE apartments SET resident_name = ?3, owner_name = ?4, owner_phone = ?5, \
             resident_phone = ?6, elevator_liable = ?7, is_manager = ?8, block = ?9, access_code = ?10 \
             WHERE building_id = ?1 AND number = ?2",
            params![
                building,
                apt.number,
                apt.resident_name,
                apt.owner_name,
                apt.owner_phone,
                apt.resident_phone,
                apt.elevator_liable,
                apt.is_manager,
                apt.block,
                apt.access_code,
            ],
        )?;
        if changed == 0 {
            return Err(AidatError::Store(format!("apartment {} not stored", apt.number)));
        }
        Ok(())
    }

    fn delete_apartment(&self, building: &str, number: u32) -> Result<()> {
        self.conn.execute(
            "DELETE FROM apartments WHERE building_id = ?1 AND number = ?2",
            params![building, number],
        )?;
        for table in ["dues", "dues_payments", "dues_extra_fees"] {
            self.conn.execute(
                &format!("DELETE FROM {table} WHERE building_id = ?1 AND apartment = ?2"),
                params![building, number],
            )?;
        }
        Ok(())
    }

    fn create_ledger_entry(&self, building: &str, year: i32, month: Month, entry: &LedgerEntry) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO ledger_entries (building_id, year, month, kind, entry_id, date, description, \
             category, amount, source_tag, apartment, resident_name) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                building,
                year,
                month.name(),
                entry.kind.as_str(),
                entry.id,
                entry.date,
                entry.description,
                entry.category,
                entry.amount,
                entry.source.map(|s| s.tag()),
                entry.apartment,
                entry.resident_name,
            ],
        )?;
        Ok(())
    }

    fn delete_ledger_entry(&self, building: &str, year: i32, month: Month, kind: EntryKind, id: u32) -> Result<()> {
        self.conn.execute(
            "DELETE FROM ledger_entries WHERE building_id = ?1 AND year = ?2 AND month = ?3 \
             AND kind = ?4 AND entry_id = ?5",
            params![building, year, month.name(), kind.as_str(), id],
        )?;
        Ok(())
    }

    fn upsert_staff_record(&self, building: &str, year: i32, r: &StaffRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO staff_records (building_id, year, month, salary, overtime, paid, advance, owed, total_paid) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             ON CONFLICT(building_id, year, month) DO UPDATE SET salary = excluded.salary, \
             overtime = excluded.overtime, paid = excluded.paid, advance = excluded.advance, \
             owed = excluded.owed, total_paid = excluded.total_paid",
            params![building, year, r.month.name(), r.salary, r.overtime, r.paid, r.advance, r.owed, r.total_paid],
        )?;
        Ok(())
    }

    fn create_extra_fee_column(&self, building: &str, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO extra_fee_columns (building_id, name) VALUES (?1, ?2)",
            params![building, name],
        )?;
        Ok(())
    }

    fn delete_extra_fee_column(&self, building: &str, name: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM extra_fee_columns WHERE building_id = ?1 AND name = ?2",
            params![building, name],
        )?;
        Ok(())
    }

    fn append_audit_log_entry(&self, building: &str, entry: &LogEntry) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO audit_log (id, building_id, created_at, action, details, user) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![entry.id, building, entry.date, entry.action, entry.details, entry.user],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn apt(number: u32) -> Apartment {
        Apartment {
            number,
            resident_name: format!("Sakin {number}"),
            owner_name: format!("Malik {number}"),
            owner_phone: Some("0532 000 00 00".into()),
            resident_phone: None,
            elevator_liable: true,
            is_manager: false,
            block: Some("A".into()),
            access_code: Some("ABC234".into()),
        }
    }

    #[test]
    fn test_apartments_are_building_scoped() {
        let (_dir, conn) = test_db();
        let store = SqliteStore::new(conn);
        store.create_apartment("b1", &apt(1)).unwrap();
        store.create_apartment("b1", &apt(2)).unwrap();
        store.create_apartment("b2", &apt(1)).unwrap();

        let b1 = store.fetch_apartments("b1").unwrap();
        assert_eq!(b1.len(), 2);
        assert_eq!(b1[0], apt(1));
        assert_eq!(store.fetch_apartments("b2").unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_apartment_is_rejected() {
        let (_dir, conn) = test_db();
        let store = SqliteStore::new(conn);
        store.create_apartment("b1", &apt(1)).unwrap();
        assert!(store.create_apartment("b1", &apt(1)).is_err());
    }

    #[test]
    fn test_dues_assemble_from_payments_and_fees() {
        let (_dir, conn) = test_db();
        let store = SqliteStore::new(conn);
        store.create_apartment("b1", &apt(4)).unwrap();
        store.save_dues_payment("b1", 2025, 4, Month::Ocak, 750.0).unwrap();
        store.save_dues_payment("b1", 2025, 4, Month::Ocak, 700.0).unwrap();
        store.save_dues_payment("b1", 2025, 4, Month::Subat, 750.0).unwrap();
        store.save_extra_fee("b1", 2025, 4, "Yakıt", 200.0).unwrap();
        store.save_elevator_payment("b1", 2025, 4, 600.0).unwrap();

        let dues = store.fetch_dues_for_year("b1", 2025).unwrap();
        assert_eq!(dues.len(), 1);
        let row = &dues[0];
        assert_eq!(row.resident_name, "Sakin 4");
        assert_eq!(row.paid(Month::Ocak), 700.0);
        assert_eq!(row.paid(Month::Subat), 750.0);
        assert_eq!(row.extra_fees.get("Yakıt"), Some(&200.0));
        assert_eq!(row.elevator_paid, 600.0);
        assert!(store.fetch_dues_for_year("b1", 2026).unwrap().is_empty());
    }

    #[test]
    fn test_ledger_entry_keeps_source() {
        let (_dir, conn) = test_db();
        let store = SqliteStore::new(conn);
        let entry = LedgerEntry {
            id: 3,
            date: "31.01.2025".into(),
            description: "OCAK ayından devir".into(),
            category: "Devir".into(),
            amount: 200.0,
            kind: EntryKind::Expense,
            source: Some(EntrySource::CarryForward { from: Month::Ocak }),
            apartment: None,
            resident_name: None,
        };
        store.create_ledger_entry("b1", 2025, Month::Subat, &entry).unwrap();
        let feb = store.fetch_operating_ledger("b1", 2025, Month::Subat).unwrap();
        assert_eq!(feb.expense, vec![entry]);
        assert!(feb.income.is_empty());

        store.delete_ledger_entry("b1", 2025, Month::Subat, EntryKind::Expense, 3).unwrap();
        assert!(store.fetch_operating_ledger("b1", 2025, Month::Subat).unwrap().expense.is_empty());
    }

    #[test]
    fn test_delete_apartment_cascades_to_dues() {
        let (_dir, conn) = test_db();
        let store = SqliteStore::new(conn);
        store.create_apartment("b1", &apt(1)).unwrap();
        store.save_dues_payment("b1", 2025, 1, Month::Ocak, 750.0).unwrap();
        store.delete_apartment("b1", 1).unwrap();
        assert!(store.fetch_apartments("b1").unwrap().is_empty());
        assert!(store.fetch_dues_for_year("b1", 2025).unwrap().is_empty());
    }

    #[test]
    fn test_staff_upsert_and_columns() {
        let (_dir, conn) = test_db();
        let store = SqliteStore::new(conn);
        let mut rec = StaffRecord::empty(Month::Mart);
        rec.salary = 17000.0;
        store.upsert_staff_record("b1", 2025, &rec).unwrap();
        rec.total_paid = 17000.0;
        store.upsert_staff_record("b1", 2025, &rec).unwrap();
        assert_eq!(store.fetch_staff_records("b1", 2025).unwrap(), vec![rec]);

        store.create_extra_fee_column("b1", "Yakıt").unwrap();
        store.create_extra_fee_column("b1", "Çatı").unwrap();
        store.create_extra_fee_column("b1", "Yakıt").unwrap();
        assert_eq!(store.fetch_extra_fee_columns("b1").unwrap(), vec!["Yakıt", "Çatı"]);
        store.delete_extra_fee_column("b1", "Yakıt").unwrap();
        assert_eq!(store.fetch_extra_fee_columns("b1").unwrap(), vec!["Çatı"]);
    }
}
