use crate::models::LogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    DuesPayment,
    ExtraFeePayment,
    ElevatorPayment,
    ApartmentAdded,
    ApartmentUpdated,
    ApartmentDeleted,
    LedgerEntryAdded,
    LedgerEntryDeleted,
    CarryForward,
    StaffRecordUpdated,
    FeePolicyUpdated,
    ColumnAdded,
    ColumnRemoved,
    YearStarted,
    YearSwitched,
}

impl AuditAction {
    pub fn code(self) -> &'static str {
        match self {
            AuditAction::DuesPayment => "DUES_PAYMENT",
            AuditAction::ExtraFeePayment => "EXTRA_FEE_PAYMENT",
            AuditAction::ElevatorPayment => "ELEVATOR_PAYMENT",
            AuditAction::ApartmentAdded => "APARTMENT_ADD",
            AuditAction::ApartmentUpdated => "APARTMENT_UPDATE",
            AuditAction::ApartmentDeleted => "APARTMENT_DELETE",
            AuditAction::LedgerEntryAdded => "LEDGER_ADD",
            AuditAction::LedgerEntryDeleted => "LEDGER_DELETE",
            AuditAction::CarryForward => "LEDGER_CARRY_FORWARD",
            AuditAction::StaffRecordUpdated => "STAFF_UPDATE",
            AuditAction::FeePolicyUpdated => "FEE_POLICY_UPDATE",
            AuditAction::ColumnAdded => "COLUMN_ADD",
            AuditAction::ColumnRemoved => "COLUMN_REMOVE",
            AuditAction::YearStarted => "YEAR_START",
            AuditAction::YearSwitched => "YEAR_SWITCH",
        }
    }
}

/// Build a log entry with an id that is unique within `existing`. Ids are
/// millisecond timestamps, bumped past the newest id on collision.
pub fn new_entry(existing: &[LogEntry], action: AuditAction, details: &str, user: &str) -> LogEntry {
    let now = chrono::Local::now();
    let newest = existing.iter().map(|e| e.id).max().unwrap_or(i64::MIN);
    let id = now.timestamp_millis().max(newest.saturating_add(1));
    LogEntry {
        id,
        date: now.to_rfc3339(),
        action: action.code().to_string(),
        details: details.to_string(),
        user: Some(user.to_string()),
    }
}
