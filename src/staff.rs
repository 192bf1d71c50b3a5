use crate::audit::AuditAction;
use crate::cache::Slice;
use crate::error::{AidatError, Result};
use crate::fmt::today;
use crate::models::{EntryKind, StaffUpdate};
use crate::month::Month;
use crate::scope::{best_effort, Scope};
use crate::sync::sync_staff_to_ledger;

impl Scope {
    /// Patch one month of payroll. Saving `total_paid` also replaces that
    /// month's payroll expense row in the ledger.
    pub fn update_staff_record(&mut self, month: Month, patch: StaffUpdate) -> Result<()> {
        self.require_admin()?;
        let fields = [patch.salary, patch.overtime, patch.paid, patch.advance, patch.owed, patch.total_paid];
        if fields.iter().flatten().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AidatError::Validation("staff amounts must be zero or more".into()));
        }

        let rec = self
            .state
            .staff
            .iter_mut()
            .find(|r| r.month == month)
            .ok_or_else(|| AidatError::NotFound(format!("staff record for {month}")))?;
        if let Some(v) = patch.salary {
            rec.salary = v;
        }
        if let Some(v) = patch.overtime {
            rec.overtime = v;
        }
        if let Some(v) = patch.paid {
            rec.paid = v;
        }
        if let Some(v) = patch.advance {
            rec.advance = v;
        }
        if let Some(v) = patch.owed {
            rec.owed = v;
        }
        if let Some(v) = patch.total_paid {
            rec.total_paid = v;
        }
        let rec = rec.clone();

        best_effort(
            "upsert_staff_record",
            self.store.upsert_staff_record(self.building(), self.state.year, &rec),
        );
        self.cache.put(Slice::StaffRecords, &self.state.staff)?;

        if let Some(amount) = patch.total_paid {
            let staff_name = self.state.staff_name.clone();
            let (removed, inserted) =
                sync_staff_to_ledger(&mut self.state.ledger, month, amount, &staff_name, &today());
            for old in removed {
                best_effort(
                    "delete_ledger_entry",
                    self.store.delete_ledger_entry(
                        self.building(),
                        self.state.year,
                        month,
                        EntryKind::Expense,
                        old.id,
                    ),
                );
            }
            if let Some(entry) = inserted {
                best_effort(
                    "create_ledger_entry",
                    self.store
                        .create_ledger_entry(self.building(), self.state.year, month, &entry),
                );
            }
            self.after_ledger_change()?;
        }

        self.audit(
            AuditAction::StaffRecordUpdated,
            &format!("{month}: ödenen {} TL", rec.total_paid),
        )
    }

    pub fn update_staff_info(&mut self, name: &str, role: &str) -> Result<()> {
        self.require_admin()?;
        self.state.staff_name = name.trim().to_string();
        self.state.staff_role = role.trim().to_string();
        self.cache.put(Slice::StaffName, &self.state.staff_name)?;
        self.cache.put(Slice::StaffRole, &self.state.staff_role)
    }

    /// Sum of what was actually paid to staff over the year.
    pub fn staff_total_paid(&self) -> f64 {
        self.state.staff.iter().map(|r| r.total_paid).sum()
    }
}
