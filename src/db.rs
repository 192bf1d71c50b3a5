use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const DB_FILE: &str = "aidat.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS apartments (
    building_id TEXT NOT NULL,
    number INTEGER NOT NULL,
    resident_name TEXT NOT NULL,
    owner_name TEXT NOT NULL,
    owner_phone TEXT,
    resident_phone TEXT,
    elevator_liable INTEGER DEFAULT 0,
    is_manager INTEGER DEFAULT 0,
    block TEXT,
    access_code TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (building_id, number)
);

CREATE TABLE IF NOT EXISTS dues (
    building_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    apartment INTEGER NOT NULL,
    resident_name TEXT NOT NULL DEFAULT '',
    carried_over REAL NOT NULL DEFAULT 0,
    elevator_paid REAL NOT NULL DEFAULT 0,
    PRIMARY KEY (building_id, year, apartment)
);

CREATE TABLE IF NOT EXISTS dues_payments (
    building_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    apartment INTEGER NOT NULL,
    month TEXT NOT NULL,
    amount REAL NOT NULL,
    PRIMARY KEY (building_id, year, apartment, month)
);

CREATE TABLE IF NOT EXISTS dues_extra_fees (
    building_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    apartment INTEGER NOT NULL,
    fee_name TEXT NOT NULL,
    amount REAL NOT NULL,
    PRIMARY KEY (building_id, year, apartment, fee_name)
);

CREATE TABLE IF NOT EXISTS extra_fee_columns (
    building_id TEXT NOT NULL,
    name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (building_id, name)
);

CREATE TABLE IF NOT EXISTS ledger_entries (
    building_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    month TEXT NOT NULL,
    kind TEXT NOT NULL,
    entry_id INTEGER NOT NULL,
    date TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    amount REAL NOT NULL,
    source_tag TEXT,
    apartment INTEGER,
    resident_name TEXT,
    PRIMARY KEY (building_id, year, month, kind, entry_id)
);

CREATE TABLE IF NOT EXISTS staff_records (
    building_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    month TEXT NOT NULL,
    salary REAL NOT NULL DEFAULT 0,
    overtime REAL NOT NULL DEFAULT 0,
    paid REAL NOT NULL DEFAULT 0,
    advance REAL NOT NULL DEFAULT 0,
    owed REAL NOT NULL DEFAULT 0,
    total_paid REAL NOT NULL DEFAULT 0,
    PRIMARY KEY (building_id, year, month)
);

CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER NOT NULL,
    building_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    action TEXT NOT NULL,
    details TEXT NOT NULL,
    user TEXT,
    PRIMARY KEY (building_id, id)
);

CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT DEFAULT (datetime('now'))
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}

#[cfg(test)]
pub(crate) fn reopen(dir: &tempfile::TempDir) -> Connection {
    get_connection(&dir.path().join("test.db")).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &[
            "apartments",
            "dues",
            "dues_payments",
            "dues_extra_fees",
            "extra_fee_columns",
            "ledger_entries",
            "staff_records",
            "audit_log",
            "kv",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }
}
