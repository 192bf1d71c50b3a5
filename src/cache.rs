use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Named pieces of building state kept in the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slice {
    Year,
    Dues,
    Apartments,
    StaffRecords,
    MonthlySummary,
    Ledger,
    ExtraFeeColumns,
    MonthlyDuesAmount,
    AnnualElevatorFee,
    ApartmentName,
    ExpenseItems,
    AuditLog,
    AvailableYears,
    StaffName,
    StaffRole,
}

impl Slice {
    pub fn key(self) -> &'static str {
        match self {
            Slice::Year => "year",
            Slice::Dues => "dues",
            Slice::Apartments => "apartments",
            Slice::StaffRecords => "staffRecords",
            Slice::MonthlySummary => "monthlySummary",
            Slice::Ledger => "ledger",
            Slice::ExtraFeeColumns => "extraFeeColumns",
            Slice::MonthlyDuesAmount => "monthlyDuesAmount",
            Slice::AnnualElevatorFee => "annualElevatorFee",
            Slice::ApartmentName => "apartmentName",
            Slice::ExpenseItems => "expenseItems",
            Slice::AuditLog => "auditLog",
            Slice::AvailableYears => "availableYears",
            Slice::StaffName => "staffName",
            Slice::StaffRole => "staffRole",
        }
    }
}

/// JSON key/value cache over the `kv` table, namespaced by building.
pub struct Cache {
    conn: Connection,
    building_id: String,
}

impl Cache {
    pub fn new(conn: Connection, building_id: &str) -> Self {
        Self { conn, building_id: building_id.to_string() }
    }

    fn slice_key(&self, slice: Slice) -> String {
        format!("b_{}_{}", self.building_id, slice.key())
    }

    fn archive_key(&self, year: i32) -> String {
        format!("b_{}_archive_{}", self.building_id, year)
    }

    fn read_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn write_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now')) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, slice: Slice) -> Result<Option<T>> {
        match self.read_raw(&self.slice_key(slice))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize + ?Sized>(&self, slice: Slice, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.write_raw(&self.slice_key(slice), &raw)
    }

    pub fn get_archive<T: DeserializeOwned>(&self, year: i32) -> Result<Option<T>> {
        match self.read_raw(&self.archive_key(year))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn put_archive<T: Serialize>(&self, year: i32, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.write_raw(&self.archive_key(year), &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{reopen, test_db};

    #[test]
    fn test_missing_slice_is_none() {
        let (_dir, conn) = test_db();
        let cache = Cache::new(conn, "b1");
        let year: Option<i32> = cache.get(Slice::Year).unwrap();
        assert!(year.is_none());
    }

    #[test]
    fn test_slices_are_namespaced_by_building() {
        let (dir, conn) = test_db();
        let a = Cache::new(conn, "b1");
        let b = Cache::new(reopen(&dir), "b2");
        a.put(Slice::ApartmentName, "Lale Apt.").unwrap();
        a.put(Slice::ApartmentName, "Papatya Apt.").unwrap();
        assert_eq!(a.get::<String>(Slice::ApartmentName).unwrap().as_deref(), Some("Papatya Apt."));
        assert!(b.get::<String>(Slice::ApartmentName).unwrap().is_none());

        let key: String = a
            .conn
            .query_row("SELECT key FROM kv", [], |row| row.get(0))
            .unwrap();
        assert_eq!(key, "b_b1_apartmentName");
    }

    #[test]
    fn test_archive_by_year() {
        let (_dir, conn) = test_db();
        let cache = Cache::new(conn, "b1");
        cache.put_archive(2024, &vec![1u32, 2, 3]).unwrap();
        assert_eq!(cache.get_archive::<Vec<u32>>(2024).unwrap(), Some(vec![1, 2, 3]));
        assert!(cache.get_archive::<Vec<u32>>(2023).unwrap().is_none());
    }
}
