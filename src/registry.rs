use rand::Rng;

use crate::audit::AuditAction;
use crate::cache::Slice;
use crate::error::{AidatError, Result};
use crate::models::{Apartment, ApartmentUpdate, DuesRow};
use crate::scope::{best_effort, Scope};

const ACCESS_CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const ACCESS_CODE_LEN: usize = 6;

/// Six characters from an alphabet without look-alikes (0/O, 1/I).
pub fn generate_access_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ACCESS_CODE_LEN)
        .map(|_| ACCESS_CODE_ALPHABET[rng.gen_range(0..ACCESS_CODE_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct NewApartment {
    /// Next free number when omitted.
    pub number: Option<u32>,
    pub resident_name: String,
    pub owner_name: String,
    pub owner_phone: Option<String>,
    pub resident_phone: Option<String>,
    pub elevator_liable: bool,
    pub is_manager: bool,
    pub block: Option<String>,
    /// Generated when omitted or blank.
    pub access_code: Option<String>,
}

impl Scope {
    fn save_apartments(&self) -> Result<()> {
        self.cache.put(Slice::Apartments, &self.state.apartments)
    }

    fn apartment_index(&self, number: u32) -> Result<usize> {
        self.state
            .apartments
            .iter()
            .position(|a| a.number == number)
            .ok_or(AidatError::UnknownApartment(number))
    }

    pub fn add_apartment(&mut self, new: NewApartment) -> Result<Apartment> {
        self.require_admin()?;
        let resident_name = new.resident_name.trim().to_string();
        if resident_name.is_empty() {
            return Err(AidatError::Validation("resident name is required".into()));
        }
        let number = match new.number {
            Some(n) => n,
            None => self
                .state
                .apartments
                .iter()
                .map(|a| a.number)
                .max()
                .unwrap_or(0)
                .checked_add(1)
                .ok_or_else(|| AidatError::Validation("no free apartment number left".into()))?,
        };
        if self.state.apartment(number).is_some() {
            return Err(AidatError::Validation(format!("apartment {number} already exists")));
        }
        let access_code = match new.access_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                let code = code.to_uppercase();
                let taken = self
                    .state
                    .apartments
                    .iter()
                    .any(|a| a.access_code.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(&code)));
                if taken {
                    return Err(AidatError::Validation(format!("access code {code} is already in use")));
                }
                code
            }
            _ => generate_access_code(),
        };
        let owner_name = match new.owner_name.trim() {
            "" => resident_name.clone(),
            owner => owner.to_string(),
        };

        let apt = Apartment {
            number,
            resident_name,
            owner_name,
            owner_phone: new.owner_phone,
            resident_phone: new.resident_phone,
            elevator_liable: new.elevator_liable,
            is_manager: new.is_manager,
            block: new.block,
            access_code: Some(access_code),
        };
        best_effort("create_apartment", self.store.create_apartment(self.building(), &apt));

        self.state.apartments.push(apt.clone());
        self.state.apartments.sort_by_key(|a| a.number);
        self.state.dues.retain(|d| d.apartment != number);
        self.state.dues.push(DuesRow::new(number, &apt.resident_name));
        self.state.dues.sort_by_key(|d| d.apartment);
        self.state.recompute_all_totals();
        self.save_apartments()?;
        self.after_dues_change()?;

        self.audit(
            AuditAction::ApartmentAdded,
            &format!("Daire {number} eklendi - Sakin: {}", apt.resident_name),
        )?;
        Ok(apt)
    }

    pub fn update_apartment(&mut self, number: u32, patch: ApartmentUpdate) -> Result<()> {
        self.require_admin()?;
        let i = self.apartment_index(number)?;
        if let Some(name) = &patch.resident_name {
            if name.trim().is_empty() {
                return Err(AidatError::Validation("resident name is required".into()));
            }
        }

        let apt = &mut self.state.apartments[i];
        if let Some(v) = patch.resident_name {
            apt.resident_name = v.trim().to_string();
        }
        if let Some(v) = patch.owner_name {
            apt.owner_name = v;
        }
        if let Some(v) = patch.owner_phone {
            apt.owner_phone = Some(v);
        }
        if let Some(v) = patch.resident_phone {
            apt.resident_phone = Some(v);
        }
        if let Some(v) = patch.elevator_liable {
            apt.elevator_liable = v;
        }
        if let Some(v) = patch.is_manager {
            apt.is_manager = v;
        }
        if let Some(v) = patch.block {
            apt.block = Some(v);
        }
        let apt = apt.clone();

        if let Some(row) = self.state.dues.iter_mut().find(|d| d.apartment == number) {
            row.resident_name = apt.resident_name.clone();
        }
        best_effort("update_apartment", self.store.update_apartment(self.building(), &apt));
        self.state.recompute_all_totals();
        self.save_apartments()?;
        self.after_dues_change()?;
        self.audit(AuditAction::ApartmentUpdated, &format!("Daire {number} güncellendi"))
    }

    /// Removes the apartment and its dues row. Its dues-sourced ledger rows
    /// disappear in the following sync.
    pub fn delete_apartment(&mut self, number: u32) -> Result<()> {
        self.require_admin()?;
        let i = self.apartment_index(number)?;
        let apt = self.state.apartments.remove(i);
        self.state.dues.retain(|d| d.apartment != number);
        best_effort("delete_apartment", self.store.delete_apartment(self.building(), number));

        self.save_apartments()?;
        self.after_dues_change()?;
        self.audit(
            AuditAction::ApartmentDeleted,
            &format!("Daire {number} silindi - Sakin: {}", apt.resident_name),
        )
    }

    pub fn regenerate_access_code(&mut self, number: u32) -> Result<String> {
        self.require_admin()?;
        let i = self.apartment_index(number)?;
        let code = generate_access_code();
        self.state.apartments[i].access_code = Some(code.clone());
        let apt = self.state.apartments[i].clone();
        best_effort("update_apartment", self.store.update_apartment(self.building(), &apt));
        self.save_apartments()?;
        self.audit(AuditAction::ApartmentUpdated, &format!("Daire {number} erişim kodu yenilendi"))?;
        Ok(code)
    }

    /// No-op when the column already exists.
    pub fn add_extra_fee_column(&mut self, name: &str) -> Result<()> {
        self.require_admin()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AidatError::Validation("column name is required".into()));
        }
        if self.state.extra_fee_columns.iter().any(|c| c == name) {
            return Ok(());
        }
        self.state.extra_fee_columns.push(name.to_string());
        best_effort(
            "create_extra_fee_column",
            self.store.create_extra_fee_column(self.building(), name),
        );
        self.cache.put(Slice::ExtraFeeColumns, &self.state.extra_fee_columns)?;
        self.audit(AuditAction::ColumnAdded, name)
    }

    /// Amounts already recorded under the column stay on the dues rows.
    pub fn remove_extra_fee_column(&mut self, name: &str) -> Result<()> {
        self.require_admin()?;
        let before = self.state.extra_fee_columns.len();
        self.state.extra_fee_columns.retain(|c| c != name);
        if self.state.extra_fee_columns.len() == before {
            return Err(AidatError::NotFound(format!("fee column '{name}'")));
        }
        best_effort(
            "delete_extra_fee_column",
            self.store.delete_extra_fee_column(self.building(), name),
        );
        self.cache.put(Slice::ExtraFeeColumns, &self.state.extra_fee_columns)?;
        self.audit(AuditAction::ColumnRemoved, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::Month;
    use crate::scope::testing::*;

    #[test]
    fn test_access_code_shape() {
        for _ in 0..50 {
            let code = generate_access_code();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| ACCESS_CODE_ALPHABET.contains(&b)));
            assert!(!code.contains('0') && !code.contains('O') && !code.contains('I'));
        }
    }

    #[test]
    fn test_add_assigns_next_number_and_dues_row() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 4, "Ali");
        let apt = scope
            .add_apartment(NewApartment { resident_name: "Veli".into(), ..Default::default() })
            .unwrap();
        assert_eq!(apt.number, 5);
        assert_eq!(apt.owner_name, "Veli");
        assert!(apt.access_code.is_some());
        assert_eq!(scope.state.dues.len(), 2);
        assert_eq!(scope.state.dues_row(5).unwrap().balance, 9000.0);
    }

    #[test]
    fn test_add_rejects_duplicate_and_blank() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        let dup = NewApartment { number: Some(1), resident_name: "X".into(), ..Default::default() };
        assert!(matches!(scope.add_apartment(dup), Err(AidatError::Validation(_))));
        let blank = NewApartment { resident_name: "  ".into(), ..Default::default() };
        assert!(matches!(scope.add_apartment(blank), Err(AidatError::Validation(_))));
        assert_eq!(scope.state.apartments.len(), 1);
    }

    #[test]
    fn test_supplied_access_code_is_kept() {
        let (_dir, mut scope) = scope();
        let apt = scope
            .add_apartment(NewApartment {
                resident_name: "Ayşe".into(),
                access_code: Some(" k7m2qp ".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(apt.access_code.as_deref(), Some("K7M2QP"));

        let clash = NewApartment {
            resident_name: "Fatma".into(),
            access_code: Some("K7M2QP".into()),
            ..Default::default()
        };
        assert!(matches!(scope.add_apartment(clash), Err(AidatError::Validation(_))));

        let blank = NewApartment {
            resident_name: "Emine".into(),
            access_code: Some("   ".into()),
            ..Default::default()
        };
        let generated = scope.add_apartment(blank).unwrap().access_code.unwrap();
        assert_eq!(generated.len(), 6);
    }

    #[test]
    fn test_next_number_overflow_is_rejected() {
        let (_dir, mut scope) = scope();
        add(&mut scope, u32::MAX, "Son");
        let next = NewApartment { resident_name: "Yeni".into(), ..Default::default() };
        assert!(matches!(scope.add_apartment(next), Err(AidatError::Validation(_))));
        assert_eq!(scope.state.apartments.len(), 1);
    }

    #[test]
    fn test_rename_refreshes_ledger_display() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        scope.update_dues_payment(1, Month::Ocak, 750.0).unwrap();
        scope
            .update_apartment(1, ApartmentUpdate { resident_name: Some("Ali Kaya".into()), ..Default::default() })
            .unwrap();
        let row = &scope.state.ledger.month(Month::Ocak).income[0];
        assert_eq!(row.description, "Ali Kaya (D:1) - OCAK Aidatı");
    }

    #[test]
    fn test_manager_flag_changes_balance() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        scope
            .update_apartment(1, ApartmentUpdate { is_manager: Some(true), elevator_liable: Some(false), ..Default::default() })
            .unwrap();
        assert_eq!(scope.state.dues_row(1).unwrap().balance, 0.0);
    }

    #[test]
    fn test_delete_removes_dues_and_ledger_rows() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        add(&mut scope, 2, "Veli");
        scope.update_dues_payment(1, Month::Ocak, 750.0).unwrap();
        scope.update_dues_payment(2, Month::Ocak, 750.0).unwrap();
        scope.delete_apartment(1).unwrap();

        assert!(scope.state.dues_row(1).is_none());
        let jan = &scope.state.ledger.month(Month::Ocak).income;
        assert_eq!(jan.len(), 1);
        assert_eq!(jan[0].apartment, Some(2));
        assert!(matches!(scope.delete_apartment(1), Err(AidatError::UnknownApartment(1))));
    }

    #[test]
    fn test_extra_fee_columns() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        scope.add_extra_fee_column("Yakıt").unwrap();
        scope.add_extra_fee_column("Yakıt").unwrap();
        assert_eq!(scope.state.extra_fee_columns, vec!["Yakıt"]);
        assert!(scope.add_extra_fee_column(" ").is_err());

        scope.update_extra_fee(1, "Yakıt", 150.0).unwrap();
        scope.remove_extra_fee_column("Yakıt").unwrap();
        assert!(scope.state.extra_fee_columns.is_empty());
        assert_eq!(scope.state.dues_row(1).unwrap().extra_fees.get("Yakıt"), Some(&150.0));
        assert!(matches!(scope.remove_extra_fee_column("Yakıt"), Err(AidatError::NotFound(_))));
    }

    #[test]
    fn test_regenerate_access_code_persists() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        let code = scope.regenerate_access_code(1).unwrap();
        assert_eq!(scope.state.apartment(1).unwrap().access_code.as_deref(), Some(code.as_str()));
    }
}
