use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::month::Month;

pub const CATEGORY_DUES_PAYMENT: &str = "Aidat Ödemesi";
pub const CATEGORY_STAFF_MONTHLY: &str = "Kapıcı Aylık";
pub const CATEGORY_CARRY_FORWARD: &str = "Devir";
pub const CATEGORY_ELEVATOR: &str = "Asansör Demirbaş";
pub const CATEGORY_INTERCOM: &str = "Diyafon";

pub const INCOME_CATEGORIES: &[&str] = &[CATEGORY_DUES_PAYMENT, CATEGORY_ELEVATOR, "Diğer"];

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Yönetim Huzur Hakkı",
    "Temizlik Malz. ve Su Gideri",
    "Elektrik Gideri",
    CATEGORY_STAFF_MONTHLY,
    "Tazminat",
    "Kapıcı Sigorta",
    "Muhasebe",
    "Asansör Bakım-Onarım",
    "Öngörülemeyen Giderler",
    "EFT/Havale Masrafı",
    "ASKİ Su",
    CATEGORY_INTERCOM,
    "Diğer",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Apartment {
    pub number: u32,
    pub resident_name: String,
    pub owner_name: String,
    #[serde(default)]
    pub owner_phone: Option<String>,
    #[serde(default)]
    pub resident_phone: Option<String>,
    #[serde(default)]
    pub elevator_liable: bool,
    #[serde(default)]
    pub is_manager: bool,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub access_code: Option<String>,
}

/// Partial edit of an apartment; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ApartmentUpdate {
    pub resident_name: Option<String>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub resident_phone: Option<String>,
    pub elevator_liable: Option<bool>,
    pub is_manager: Option<bool>,
    pub block: Option<String>,
}

/// One apartment's dues for one year. `total_paid` and `balance` are cached
/// results of `balance::compute_totals` and are rewritten on every change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DuesRow {
    pub apartment: u32,
    pub resident_name: String,
    pub carried_over: f64,
    #[serde(default)]
    pub monthly_payments: BTreeMap<Month, f64>,
    #[serde(default)]
    pub extra_fees: BTreeMap<String, f64>,
    #[serde(default)]
    pub elevator_paid: f64,
    #[serde(default)]
    pub total_paid: f64,
    #[serde(default)]
    pub balance: f64,
}

impl DuesRow {
    pub fn new(apartment: u32, resident_name: &str) -> Self {
        Self {
            apartment,
            resident_name: resident_name.to_string(),
            ..Self::default()
        }
    }

    pub fn paid(&self, month: Month) -> f64 {
        self.monthly_payments.get(&month).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<EntryKind> {
        match s.trim().to_lowercase().as_str() {
            "income" | "gelir" => Some(EntryKind::Income),
            "expense" | "gider" => Some(EntryKind::Expense),
            _ => None,
        }
    }
}

/// Structured back-reference from a ledger row to the fact that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntrySource {
    DuesPayment { apartment: u32, month: Month },
    StaffPayment { month: Month },
    CarryForward { from: Month },
}

impl EntrySource {
    /// Machine tag used by older ledgers and the store's `source_tag` column.
    pub fn tag(&self) -> String {
        match self {
            EntrySource::DuesPayment { apartment, .. } => format!("aidat_dues_{apartment}"),
            EntrySource::StaffPayment { month } => format!("staff_payment_{month}"),
            EntrySource::CarryForward { from } => format!("devir_from_{from}"),
        }
    }

    /// Inverse of `tag`. Dues tags do not carry the month, so the month the
    /// row lives in is supplied by the caller.
    pub fn from_tag(tag: &str, row_month: Month) -> Option<EntrySource> {
        if let Some(rest) = tag.strip_prefix("aidat_dues_") {
            let apartment = rest.parse().ok()?;
            return Some(EntrySource::DuesPayment { apartment, month: row_month });
        }
        if let Some(rest) = tag.strip_prefix("staff_payment_") {
            return rest.parse().ok().map(|month| EntrySource::StaffPayment { month });
        }
        if let Some(rest) = tag.strip_prefix("devir_from_") {
            return rest.parse().ok().map(|from| EntrySource::CarryForward { from });
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: u32,
    pub date: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub kind: EntryKind,
    #[serde(default)]
    pub source: Option<EntrySource>,
    #[serde(default)]
    pub apartment: Option<u32>,
    #[serde(default)]
    pub resident_name: Option<String>,
}

/// User-supplied fields for a new ledger row; the id is assigned on insert.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub date: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub apartment: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthLedger {
    #[serde(default)]
    pub income: Vec<LedgerEntry>,
    #[serde(default)]
    pub expense: Vec<LedgerEntry>,
}

impl MonthLedger {
    pub fn list(&self, kind: EntryKind) -> &Vec<LedgerEntry> {
        match kind {
            EntryKind::Income => &self.income,
            EntryKind::Expense => &self.expense,
        }
    }

    pub fn list_mut(&mut self, kind: EntryKind) -> &mut Vec<LedgerEntry> {
        match kind {
            EntryKind::Income => &mut self.income,
            EntryKind::Expense => &mut self.expense,
        }
    }

    pub fn total(&self, kind: EntryKind) -> f64 {
        self.list(kind).iter().map(|e| e.amount).sum()
    }

    /// `max(existing ids) + 1`, or 1 for an empty list.
    pub fn next_id(&self, kind: EntryKind) -> u32 {
        self.list(kind).iter().map(|e| e.id).max().unwrap_or(0) + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatingLedger {
    months: BTreeMap<Month, MonthLedger>,
}

impl Default for OperatingLedger {
    fn default() -> Self {
        Self {
            months: Month::ALL.into_iter().map(|m| (m, MonthLedger::default())).collect(),
        }
    }
}

impl OperatingLedger {
    pub fn month(&self, month: Month) -> &MonthLedger {
        static EMPTY: MonthLedger = MonthLedger {
            income: Vec::new(),
            expense: Vec::new(),
        };
        self.months.get(&month).unwrap_or(&EMPTY)
    }

    pub fn month_mut(&mut self, month: Month) -> &mut MonthLedger {
        self.months.entry(month).or_default()
    }

    pub fn set_month(&mut self, month: Month, data: MonthLedger) {
        self.months.insert(month, data);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Month, &MonthLedger)> {
        Month::ALL.into_iter().map(move |m| (m, self.month(m)))
    }

    pub fn total(&self, kind: EntryKind) -> f64 {
        self.iter().map(|(_, m)| m.total(kind)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// `None` marks the carry-forward ("Devir") row.
    pub month: Option<Month>,
    pub income: f64,
    pub expense: f64,
    pub elevator: f64,
    pub cash: f64,
    pub bank: f64,
    pub difference: f64,
}

impl SummaryRow {
    pub fn empty(month: Option<Month>) -> Self {
        Self {
            month,
            income: 0.0,
            expense: 0.0,
            elevator: 0.0,
            cash: 0.0,
            bank: 0.0,
            difference: 0.0,
        }
    }
}

pub fn default_summary() -> Vec<SummaryRow> {
    std::iter::once(SummaryRow::empty(None))
        .chain(Month::ALL.into_iter().map(|m| SummaryRow::empty(Some(m))))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffRecord {
    pub month: Month,
    pub salary: f64,
    pub overtime: f64,
    pub paid: f64,
    pub advance: f64,
    pub owed: f64,
    pub total_paid: f64,
}

impl StaffRecord {
    pub fn empty(month: Month) -> Self {
        Self {
            month,
            salary: 0.0,
            overtime: 0.0,
            paid: 0.0,
            advance: 0.0,
            owed: 0.0,
            total_paid: 0.0,
        }
    }
}

pub fn default_staff_records() -> Vec<StaffRecord> {
    Month::ALL.into_iter().map(StaffRecord::empty).collect()
}

#[derive(Debug, Clone, Default)]
pub struct StaffUpdate {
    pub salary: Option<f64>,
    pub overtime: Option<f64>,
    pub paid: Option<f64>,
    pub advance: Option<f64>,
    pub owed: Option<f64>,
    pub total_paid: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeePolicy {
    pub monthly_dues: f64,
    pub annual_elevator_fee: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    pub id: u32,
    pub description: String,
    pub amount: f64,
    pub quantity: u32,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub date: String,
    pub action: String,
    pub details: String,
    #[serde(default)]
    pub user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip_for_each_source() {
        let dues = EntrySource::DuesPayment { apartment: 7, month: Month::Mart };
        assert_eq!(dues.tag(), "aidat_dues_7");
        assert_eq!(EntrySource::from_tag("aidat_dues_7", Month::Mart), Some(dues));

        let staff = EntrySource::StaffPayment { month: Month::Subat };
        assert_eq!(staff.tag(), "staff_payment_ŞUBAT");
        assert_eq!(EntrySource::from_tag(&staff.tag(), Month::Ocak), Some(staff));

        let devir = EntrySource::CarryForward { from: Month::Ekim };
        assert_eq!(EntrySource::from_tag("devir_from_EKİM", Month::Kasim), Some(devir));
    }

    #[test]
    fn test_from_tag_rejects_plain_text() {
        assert_eq!(EntrySource::from_tag("Elektrik faturası", Month::Ocak), None);
        assert_eq!(EntrySource::from_tag("aidat_dues_x", Month::Ocak), None);
    }

    #[test]
    fn test_next_id_after_deleting_top() {
        let mut m = MonthLedger::default();
        for id in [1, 2, 5] {
            m.income.push(LedgerEntry {
                id,
                date: String::new(),
                description: "x".into(),
                category: "Diğer".into(),
                amount: 1.0,
                kind: EntryKind::Income,
                source: None,
                apartment: None,
                resident_name: None,
            });
        }
        assert_eq!(m.next_id(EntryKind::Income), 6);
        assert_eq!(m.next_id(EntryKind::Expense), 1);
    }

    #[test]
    fn test_default_ledger_has_all_months() {
        let ledger = OperatingLedger::default();
        assert_eq!(ledger.iter().count(), 12);
        let json = serde_json::to_string(&ledger).unwrap();
        assert!(json.starts_with("{\"OCAK\""));
    }

    #[test]
    fn test_default_summary_leads_with_carry_forward() {
        let rows = default_summary();
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[0].month, None);
        assert_eq!(rows[1].month, Some(Month::Ocak));
    }
}
