use std::collections::HashMap;

use crate::models::{
    Apartment, DuesRow, EntryKind, EntrySource, LedgerEntry, MonthLedger, OperatingLedger,
    CATEGORY_DUES_PAYMENT, CATEGORY_STAFF_MONTHLY,
};
use crate::month::Month;

pub fn dues_display(resident: &str, apartment: u32, month: Month) -> String {
    format!("{resident} (D:{apartment}) - {month} Aidatı")
}

pub fn staff_display(month: Month, staff_name: &str) -> String {
    format!("{month} Ayı Personel Ödemesi ({staff_name})")
}

fn dues_source_of(entry: &LedgerEntry) -> Option<(u32, Month)> {
    match entry.source {
        Some(EntrySource::DuesPayment { apartment, month }) => Some((apartment, month)),
        _ => None,
    }
}

/// Bring every month's dues-payment income rows in line with the dues map.
///
/// Afterwards each (apartment, month) with a positive payment owns exactly one
/// income row carrying that amount, and no other dues-sourced rows exist. Rows
/// that already match are left in place with their ids, so a second call with
/// the same inputs changes nothing and returns `false`.
pub fn sync_dues_to_ledger(
    ledger: &mut OperatingLedger,
    dues: &[DuesRow],
    apartments: &[Apartment],
    date: &str,
) -> bool {
    let residents: HashMap<u32, &str> = apartments
        .iter()
        .map(|a| (a.number, a.resident_name.as_str()))
        .collect();

    let mut changed = false;
    for month in Month::ALL {
        let data = ledger.month_mut(month);
        changed |= sync_month(data, month, dues, &residents, date);
    }
    changed
}

fn sync_month(
    data: &mut MonthLedger,
    month: Month,
    dues: &[DuesRow],
    residents: &HashMap<u32, &str>,
    date: &str,
) -> bool {
    let mut changed = false;

    // Rows with no positive payment behind them, or pointing at another month.
    let before = data.income.len();
    data.income.retain(|e| match dues_source_of(e) {
        Some((apt, src_month)) => {
            src_month == month
                && dues
                    .iter()
                    .any(|d| d.apartment == apt && d.paid(month) > 0.0)
        }
        None => true,
    });
    changed |= data.income.len() != before;

    for row in dues {
        let amount = row.paid(month);
        if amount <= 0.0 {
            continue;
        }
        let resident = residents
            .get(&row.apartment)
            .copied()
            .unwrap_or(row.resident_name.as_str());
        let display = dues_display(resident, row.apartment, month);

        let matching: Vec<usize> = data
            .income
            .iter()
            .enumerate()
            .filter(|(_, e)| dues_source_of(e) == Some((row.apartment, month)))
            .map(|(i, _)| i)
            .collect();

        if let [only] = matching.as_slice() {
            let entry = &mut data.income[*only];
            if entry.amount == amount {
                if entry.description != display || entry.resident_name.as_deref() != Some(resident) {
                    entry.description = display;
                    entry.resident_name = Some(resident.to_string());
                    changed = true;
                }
                continue;
            }
        }

        if !matching.is_empty() {
            data.income
                .retain(|e| dues_source_of(e) != Some((row.apartment, month)));
        }
        let id = data.next_id(EntryKind::Income);
        data.income.push(LedgerEntry {
            id,
            date: date.to_string(),
            description: display,
            category: CATEGORY_DUES_PAYMENT.to_string(),
            amount,
            kind: EntryKind::Income,
            source: Some(EntrySource::DuesPayment { apartment: row.apartment, month }),
            apartment: Some(row.apartment),
            resident_name: Some(resident.to_string()),
        });
        changed = true;
    }
    changed
}

/// The dues fact a deleted ledger row stood for, if any.
pub fn reverse_target(entry: &LedgerEntry) -> Option<(u32, Month)> {
    if entry.kind != EntryKind::Income {
        return None;
    }
    dues_source_of(entry)
}

/// Replace the payroll expense row for `month`. Returns the row that was
/// removed (if any) and the row that was inserted (if `amount > 0`), so the
/// caller can mirror both to the store.
pub fn sync_staff_to_ledger(
    ledger: &mut OperatingLedger,
    month: Month,
    amount: f64,
    staff_name: &str,
    date: &str,
) -> (Vec<LedgerEntry>, Option<LedgerEntry>) {
    let source = EntrySource::StaffPayment { month };
    let data = ledger.month_mut(month);

    let (removed, kept): (Vec<LedgerEntry>, Vec<LedgerEntry>) = std::mem::take(&mut data.expense)
        .into_iter()
        .partition(|e| e.source == Some(source));
    data.expense = kept;

    if amount <= 0.0 {
        return (removed, None);
    }

    let entry = LedgerEntry {
        id: data.next_id(EntryKind::Expense),
        date: date.to_string(),
        description: staff_display(month, staff_name),
        category: CATEGORY_STAFF_MONTHLY.to_string(),
        amount,
        kind: EntryKind::Expense,
        source: Some(source),
        apartment: None,
        resident_name: None,
    };
    data.expense.push(entry.clone());
    (removed, Some(entry))
}
