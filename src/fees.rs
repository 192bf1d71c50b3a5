use crate::audit::AuditAction;
use crate::cache::Slice;
use crate::error::{AidatError, Result};
use crate::models::ExpenseItem;
use crate::scope::Scope;

/// Starter budget for a new building, split over 23 units.
pub fn default_expense_items() -> Vec<ExpenseItem> {
    [
        ("YÖNETİM VE HUZUR HAKKI", 3000.0),
        ("TEMİZLİK MALZ. VE SU GİDERİ", 2000.0),
        ("ELEKTRİK GİDERİ", 1500.0),
        ("KAPICI AYLIK", 6500.0),
        ("TAZMİNAT", 750.0),
        ("KAPICI SSK PRİMİ", 3200.0),
        ("MUHASEBE", 1200.0),
        ("ASANSÖR PERİYODİK BAKIM-ONARIM", 3800.0),
        ("ÖNGÖRÜLEMEYEN GİDERLERİ", 2500.0),
        ("YILLIK ASANSÖR MUAYENE BEDELİ", 750.0),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (description, amount))| ExpenseItem {
        id: i as u32 + 1,
        description: description.to_string(),
        amount,
        quantity: 23,
        unit: "TL".to_string(),
    })
    .collect()
}

/// Per-unit share of the budget, rounded up to the next 10.
pub fn suggested_monthly_dues(items: &[ExpenseItem]) -> f64 {
    let per_unit: f64 = items
        .iter()
        .map(|item| item.amount / f64::from(item.quantity.max(1)))
        .sum();
    (per_unit / 10.0).ceil() * 10.0
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseItemUpdate {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub quantity: Option<u32>,
    pub unit: Option<String>,
}

fn check_fee(value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AidatError::Validation(format!("fee must be zero or more, got {value}")));
    }
    Ok(())
}

impl Scope {
    pub fn update_monthly_dues(&mut self, amount: f64) -> Result<()> {
        self.require_admin()?;
        check_fee(amount)?;
        self.state.policy.monthly_dues = amount;
        self.state.recompute_all_totals();
        self.cache.put(Slice::MonthlyDuesAmount, &amount)?;
        self.cache.put(Slice::Dues, &self.state.dues)?;
        self.audit(AuditAction::FeePolicyUpdated, &format!("Aylık aidat: {amount} TL"))
    }

    pub fn update_annual_elevator_fee(&mut self, amount: f64) -> Result<()> {
        self.require_admin()?;
        check_fee(amount)?;
        self.state.policy.annual_elevator_fee = amount;
        self.state.recompute_all_totals();
        self.cache.put(Slice::AnnualElevatorFee, &amount)?;
        self.cache.put(Slice::Dues, &self.state.dues)?;
        self.audit(AuditAction::FeePolicyUpdated, &format!("Yıllık asansör: {amount} TL"))
    }

    pub fn update_building_name(&mut self, name: &str) -> Result<()> {
        self.require_admin()?;
        self.state.building_name = name.trim().to_string();
        self.cache.put(Slice::ApartmentName, &self.state.building_name)
    }

    pub fn add_expense_item(&mut self, description: &str, amount: f64, quantity: u32, unit: &str) -> Result<u32> {
        self.require_admin()?;
        check_fee(amount)?;
        if description.trim().is_empty() {
            return Err(AidatError::Validation("description is required".into()));
        }
        let id = self.state.expense_items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        self.state.expense_items.push(ExpenseItem {
            id,
            description: description.trim().to_string(),
            amount,
            quantity: quantity.max(1),
            unit: unit.to_string(),
        });
        self.cache.put(Slice::ExpenseItems, &self.state.expense_items)?;
        Ok(id)
    }

    pub fn update_expense_item(&mut self, id: u32, patch: ExpenseItemUpdate) -> Result<()> {
        self.require_admin()?;
        if let Some(amount) = patch.amount {
            check_fee(amount)?;
        }
        let item = self
            .state
            .expense_items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| AidatError::NotFound(format!("expense item {id}")))?;
        if let Some(v) = patch.description {
            item.description = v;
        }
        if let Some(v) = patch.amount {
            item.amount = v;
        }
        if let Some(v) = patch.quantity {
            item.quantity = v.max(1);
        }
        if let Some(v) = patch.unit {
            item.unit = v;
        }
        self.cache.put(Slice::ExpenseItems, &self.state.expense_items)
    }

    pub fn remove_expense_item(&mut self, id: u32) -> Result<()> {
        self.require_admin()?;
        let before = self.state.expense_items.len();
        self.state.expense_items.retain(|i| i.id != id);
        if self.state.expense_items.len() == before {
            return Err(AidatError::NotFound(format!("expense item {id}")));
        }
        self.cache.put(Slice::ExpenseItems, &self.state.expense_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::testing::*;

    #[test]
    fn test_suggested_dues_rounds_up_to_ten() {
        let items = vec![
            ExpenseItem { id: 1, description: "a".into(), amount: 2300.0, quantity: 23, unit: "TL".into() },
            ExpenseItem { id: 2, description: "b".into(), amount: 45.0, quantity: 1, unit: "TL".into() },
        ];
        assert_eq!(suggested_monthly_dues(&items), 150.0);
        assert_eq!(suggested_monthly_dues(&[]), 0.0);
    }

    #[test]
    fn test_default_budget() {
        let items = default_expense_items();
        assert_eq!(items.len(), 10);
        assert_eq!(items[9].id, 10);
        assert_eq!(suggested_monthly_dues(&items), 1100.0);
    }

    #[test]
    fn test_dues_change_recomputes_balances() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        scope.update_monthly_dues(1000.0).unwrap();
        assert_eq!(scope.state.dues_row(1).unwrap().balance, 12000.0 + 600.0);
        scope.update_annual_elevator_fee(0.0).unwrap();
        assert_eq!(scope.state.dues_row(1).unwrap().balance, 12000.0);
        assert!(scope.update_monthly_dues(-1.0).is_err());
    }

    #[test]
    fn test_expense_item_crud() {
        let (_dir, mut scope) = scope();
        let id = scope.add_expense_item("Bahçe bakımı", 460.0, 23, "TL").unwrap();
        assert_eq!(id, 11);
        scope
            .update_expense_item(id, ExpenseItemUpdate { amount: Some(690.0), ..Default::default() })
            .unwrap();
        assert_eq!(scope.state.expense_items.last().map(|i| i.amount), Some(690.0));
        scope.remove_expense_item(id).unwrap();
        assert!(scope.remove_expense_item(id).is_err());
    }
}
