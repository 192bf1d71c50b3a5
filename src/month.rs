use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AidatError;

/// Calendar month keyed by its canonical Turkish name. Ordering follows the
/// calendar, so `BTreeMap<Month, _>` iterates January first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    #[serde(rename = "OCAK")]
    Ocak,
    #[serde(rename = "ŞUBAT")]
    Subat,
    #[serde(rename = "MART")]
    Mart,
    #[serde(rename = "NİSAN")]
    Nisan,
    #[serde(rename = "MAYIS")]
    Mayis,
    #[serde(rename = "HAZİRAN")]
    Haziran,
    #[serde(rename = "TEMMUZ")]
    Temmuz,
    #[serde(rename = "AĞUSTOS")]
    Agustos,
    #[serde(rename = "EYLÜL")]
    Eylul,
    #[serde(rename = "EKİM")]
    Ekim,
    #[serde(rename = "KASIM")]
    Kasim,
    #[serde(rename = "ARALIK")]
    Aralik,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Ocak,
        Month::Subat,
        Month::Mart,
        Month::Nisan,
        Month::Mayis,
        Month::Haziran,
        Month::Temmuz,
        Month::Agustos,
        Month::Eylul,
        Month::Ekim,
        Month::Kasim,
        Month::Aralik,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Month::Ocak => "OCAK",
            Month::Subat => "ŞUBAT",
            Month::Mart => "MART",
            Month::Nisan => "NİSAN",
            Month::Mayis => "MAYIS",
            Month::Haziran => "HAZİRAN",
            Month::Temmuz => "TEMMUZ",
            Month::Agustos => "AĞUSTOS",
            Month::Eylul => "EYLÜL",
            Month::Ekim => "EKİM",
            Month::Kasim => "KASIM",
            Month::Aralik => "ARALIK",
        }
    }

    /// 0-based; January is 0.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Month> {
        Month::ALL.get(index).copied()
    }

    /// The following calendar month, or `None` for December.
    pub fn next(self) -> Option<Month> {
        Month::from_index(self.index() + 1)
    }

    /// Months from January up to and including `self`.
    pub fn through(self) -> impl Iterator<Item = Month> {
        Month::ALL.into_iter().take(self.index() + 1)
    }

    /// Months strictly before `self`.
    pub fn before(self) -> impl Iterator<Item = Month> {
        Month::ALL.into_iter().take(self.index())
    }

    pub fn current() -> Month {
        use chrono::Datelike;
        let idx = chrono::Local::now().month0() as usize;
        Month::from_index(idx).unwrap_or(Month::Ocak)
    }
}

/// Upper-case and strip Turkish diacritics so `nisan`, `NISAN` and `NİSAN`
/// all compare equal.
fn fold(input: &str) -> String {
    input
        .trim()
        .chars()
        .map(|c| match c {
            'ç' | 'Ç' => 'C',
            'ğ' | 'Ğ' => 'G',
            'ı' | 'I' | 'i' | 'İ' => 'I',
            'ö' | 'Ö' => 'O',
            'ş' | 'Ş' => 'S',
            'ü' | 'Ü' => 'U',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

impl FromStr for Month {
    type Err = AidatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.trim().parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(Month::from_index)
                .ok_or_else(|| AidatError::Validation(format!("Month out of range: {n}")));
        }
        let folded = fold(s);
        Month::ALL
            .into_iter()
            .find(|m| fold(m.name()) == folded)
            .ok_or_else(|| AidatError::Validation(format!("Unknown month: {s}")))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_order() {
        assert_eq!(Month::Ocak.index(), 0);
        assert_eq!(Month::Aralik.index(), 11);
        assert!(Month::Subat < Month::Mart);
        assert_eq!(Month::Kasim.next(), Some(Month::Aralik));
        assert_eq!(Month::Aralik.next(), None);
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!("ŞUBAT".parse::<Month>().unwrap(), Month::Subat);
        assert_eq!("subat".parse::<Month>().unwrap(), Month::Subat);
        assert_eq!("Nisan".parse::<Month>().unwrap(), Month::Nisan);
        assert_eq!("AĞUSTOS".parse::<Month>().unwrap(), Month::Agustos);
        assert_eq!("12".parse::<Month>().unwrap(), Month::Aralik);
        assert!("0".parse::<Month>().is_err());
        assert!("13".parse::<Month>().is_err());
        assert!("BRUMAIRE".parse::<Month>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&Month::Haziran).unwrap();
        assert_eq!(json, "\"HAZİRAN\"");
        let back: Month = serde_json::from_str("\"EYLÜL\"").unwrap();
        assert_eq!(back, Month::Eylul);
    }

    #[test]
    fn test_through_and_before() {
        assert_eq!(Month::Mart.through().count(), 3);
        assert_eq!(Month::Mart.before().count(), 2);
        assert_eq!(Month::Ocak.before().count(), 0);
    }
}
