use regex::Regex;

use crate::audit::AuditAction;
use crate::balance;
use crate::error::{AidatError, Result};
use crate::fmt::{signed_money, today};
use crate::models::{
    EntryKind, EntrySource, LedgerEntry, NewEntry, CATEGORY_CARRY_FORWARD, CATEGORY_DUES_PAYMENT,
};
use crate::month::Month;
use crate::scope::{best_effort, Scope};
use crate::sync::reverse_target;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthTotals {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// Ledger dates are `dd.mm.yyyy`; an empty date means today.
fn check_date(date: &str) -> Result<()> {
    let re = Regex::new(r"^(0[1-9]|[12]\d|3[01])\.(0[1-9]|1[0-2])\.\d{4}$")
        .map_err(|e| AidatError::Validation(format!("date pattern: {e}")))?;
    if date.is_empty() || re.is_match(date) {
        Ok(())
    } else {
        Err(AidatError::Validation(format!("date must be dd.mm.yyyy, got '{date}'")))
    }
}

pub fn carry_forward_display(from: Month, net: f64) -> String {
    format!("{from} ayından devir (Net Fark: {})", signed_money(net))
}

impl Scope {
    pub fn month_totals(&self, month: Month) -> MonthTotals {
        let data = self.state.ledger.month(month);
        let income = data.total(EntryKind::Income);
        let expense = data.total(EntryKind::Expense);
        MonthTotals { income, expense, net: income - expense }
    }

    /// Append a manual row. A dues-payment income row is not stored as typed:
    /// it becomes that apartment's payment for the month and the sync writes
    /// the ledger row.
    pub fn add_entry(&mut self, month: Month, kind: EntryKind, new: NewEntry) -> Result<()> {
        self.require_admin()?;
        let description = new.description.trim();
        let category = new.category.trim();
        if description.is_empty() || category.is_empty() {
            return Err(AidatError::Validation("description and category are required".into()));
        }
        if !new.amount.is_finite() || new.amount <= 0.0 {
            return Err(AidatError::Validation("amount must be greater than zero".into()));
        }
        let date = new.date.trim();
        check_date(date)?;

        if kind == EntryKind::Income && category == CATEGORY_DUES_PAYMENT {
            let number = new
                .apartment
                .ok_or_else(|| AidatError::Validation("dues payments need an apartment".into()))?;
            self.require_apartment(number)?;
            return self.update_dues_payment(number, month, new.amount);
        }

        let entry = LedgerEntry {
            id: self.state.ledger.month(month).next_id(kind),
            date: if date.is_empty() { today() } else { date.to_string() },
            description: description.to_string(),
            category: category.to_string(),
            amount: new.amount,
            kind,
            source: None,
            apartment: new.apartment,
            resident_name: new
                .apartment
                .and_then(|n| self.state.apartment(n))
                .map(|a| a.resident_name.clone()),
        };
        self.state.ledger.month_mut(month).list_mut(kind).push(entry.clone());
        best_effort(
            "create_ledger_entry",
            self.store
                .create_ledger_entry(&self.session.building_id, self.state.year, month, &entry),
        );
        self.after_ledger_change()?;
        self.audit(
            AuditAction::LedgerEntryAdded,
            &format!("{month} - {}: {} ({} TL)", kind.as_str(), entry.description, entry.amount),
        )
    }

    /// Remove a row. Deleting a dues-payment income row zeroes that payment,
    /// so the dues schedule and the ledger stay in agreement.
    pub fn delete_entry(&mut self, month: Month, kind: EntryKind, id: u32) -> Result<()> {
        self.require_admin()?;
        let list = self.state.ledger.month_mut(month).list_mut(kind);
        let pos = list
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| AidatError::NotFound(format!("{month} {} entry {id}", kind.as_str())))?;
        let entry = list.remove(pos);

        if let Some((number, paid_month)) = reverse_target(&entry) {
            let policy = self.state.policy;
            if let Some(i) = self.state.dues.iter().position(|d| d.apartment == number) {
                self.state.dues[i].monthly_payments.insert(paid_month, 0.0);
                if let Some(apt) = self.state.apartments.iter().find(|a| a.number == number) {
                    balance::apply_totals(apt, &mut self.state.dues[i], &policy);
                }
                best_effort(
                    "save_dues_payment",
                    self.store.save_dues_payment(
                        &self.session.building_id,
                        self.state.year,
                        number,
                        paid_month,
                        0.0,
                    ),
                );
            }
            self.after_dues_change()?;
        } else {
            best_effort(
                "delete_ledger_entry",
                self.store
                    .delete_ledger_entry(&self.session.building_id, self.state.year, month, kind, id),
            );
            self.after_ledger_change()?;
        }
        self.audit(
            AuditAction::LedgerEntryDeleted,
            &format!("{month} - {} ID: {id}", kind.as_str()),
        )
    }

    /// Carry this month's net into the next month as a single "Devir" row,
    /// replacing any earlier carry from the same month.
    pub fn transfer_net_difference(&mut self, month: Month) -> Result<LedgerEntry> {
        self.require_admin()?;
        let next = month.next().ok_or_else(|| {
            AidatError::Validation("December cannot be carried forward; start a new year instead".into())
        })?;
        let net = self.month_totals(month).net;
        let source = EntrySource::CarryForward { from: month };

        let data = self.state.ledger.month_mut(next);
        let mut stale = Vec::new();
        for kind in [EntryKind::Income, EntryKind::Expense] {
            let list = data.list_mut(kind);
            stale.extend(list.iter().filter(|e| e.source == Some(source)).map(|e| (kind, e.id)));
            list.retain(|e| e.source != Some(source));
        }

        let kind = if net >= 0.0 { EntryKind::Income } else { EntryKind::Expense };
        let entry = LedgerEntry {
            id: data.next_id(kind),
            date: today(),
            description: carry_forward_display(month, net),
            category: CATEGORY_CARRY_FORWARD.to_string(),
            amount: net.abs(),
            kind,
            source: Some(source),
            apartment: None,
            resident_name: None,
        };
        data.list_mut(kind).push(entry.clone());

        for (kind, id) in stale {
            best_effort(
                "delete_ledger_entry",
                self.store
                    .delete_ledger_entry(&self.session.building_id, self.state.year, next, kind, id),
            );
        }
        best_effort(
            "create_ledger_entry",
            self.store
                .create_ledger_entry(&self.session.building_id, self.state.year, next, &entry),
        );
        self.after_ledger_change()?;
        self.audit(AuditAction::CarryForward, &entry.description)?;
        Ok(entry)
    }
}
