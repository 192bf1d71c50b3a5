use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::fmt::amount;
use crate::models::{EntryKind, LedgerEntry};
use crate::month::Month;
use crate::scope::State;
use crate::summary::Icmal;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => amount(*n),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    fn new(title: String, headers: &[&str]) -> Self {
        Self {
            title,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

fn titled(state: &State, what: &str) -> String {
    if state.building_name.is_empty() {
        format!("{what} {}", state.year)
    } else {
        format!("{} - {what} {}", state.building_name, state.year)
    }
}

pub fn dues_table(state: &State) -> Table {
    let mut headers = vec!["Daire", "Sakin", "Devir"];
    headers.extend(Month::ALL.iter().map(|m| m.name()));
    headers.extend(state.extra_fee_columns.iter().map(String::as_str));
    headers.extend(["Asansör", "Toplam Ödenen", "Bakiye"]);
    let mut table = Table::new(titled(state, "Aidat Çizelgesi"), &headers);

    for row in &state.dues {
        let mut cells: Vec<Cell> = vec![
            row.apartment.to_string().into(),
            row.resident_name.clone().into(),
            row.carried_over.into(),
        ];
        cells.extend(Month::ALL.iter().map(|m| Cell::Number(row.paid(*m))));
        cells.extend(
            state
                .extra_fee_columns
                .iter()
                .map(|c| Cell::Number(row.extra_fees.get(c).copied().unwrap_or(0.0))),
        );
        cells.extend([
            Cell::Number(row.elevator_paid),
            Cell::Number(row.total_paid),
            Cell::Number(row.balance),
        ]);
        table.rows.push(cells);
    }
    table
}

pub fn ledger_table(state: &State, month: Month) -> Table {
    let mut table = Table::new(
        titled(state, &format!("İşletme Defteri {month}")),
        &["No", "Tarih", "Tür", "Açıklama", "Kategori", "Tutar"],
    );
    let data = state.ledger.month(month);
    for (label, kind) in [("Gelir", EntryKind::Income), ("Gider", EntryKind::Expense)] {
        for e in data.list(kind) {
            table.rows.push(vec![
                e.id.to_string().into(),
                e.date.clone().into(),
                label.into(),
                e.description.clone().into(),
                e.category.clone().into(),
                e.amount.into(),
            ]);
        }
    }
    table
}

pub fn icmal_table(state: &State, icmal: &Icmal) -> Table {
    let mut table = Table::new(
        titled(state, "İcmal"),
        &["Ay", "Gelir", "Gider", "Asansör", "Diyafon", "Fark", "Kasa", "Banka"],
    );
    table.rows.push(vec![
        "DEVİR".into(),
        icmal.opening_cash.into(),
        Cell::Text(String::new()),
        Cell::Text(String::new()),
        Cell::Text(String::new()),
        Cell::Text(String::new()),
        icmal.opening_cash.into(),
        Cell::Text(String::new()),
    ]);
    for r in &icmal.rows {
        table.rows.push(vec![
            r.month.name().into(),
            r.income.into(),
            r.expense.into(),
            r.elevator.into(),
            r.intercom.into(),
            r.difference.into(),
            r.cash.into(),
            r.bank.into(),
        ]);
    }
    table.rows.push(vec![
        "TOPLAM".into(),
        icmal.total_income.into(),
        icmal.total_expense.into(),
        icmal.total_elevator.into(),
        icmal.total_intercom.into(),
        (icmal.total_income - icmal.total_expense).into(),
        icmal.closing_cash.into(),
        Cell::Text(String::new()),
    ]);
    table
}

pub fn staff_table(state: &State) -> Table {
    let title = if state.staff_name.is_empty() {
        titled(state, "Personel")
    } else {
        titled(state, &format!("Personel ({})", state.staff_name))
    };
    let mut table = Table::new(
        title,
        &["Ay", "Maaş", "Mesai", "Ödenen", "Avans", "Alacak", "Toplam Ödenen"],
    );
    for r in &state.staff {
        table.rows.push(vec![
            r.month.name().into(),
            r.salary.into(),
            r.overtime.into(),
            r.paid.into(),
            r.advance.into(),
            r.owed.into(),
            r.total_paid.into(),
        ]);
    }
    table
}

/// Excel-friendly CSV: UTF-8 BOM, `;` separated, Turkish number format,
/// the title on its own line above the header.
pub fn write_csv<W: Write>(table: &Table, mut out: W) -> Result<()> {
    out.write_all("\u{FEFF}".as_bytes())?;
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_writer(out);
    wtr.write_record([table.title.as_str()])?;
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(Cell::render))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(table, std::io::BufWriter::new(file))
}

/// Printable receipt for one ledger row: a payment receipt for income, an
/// expense voucher for expenses.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub kind: EntryKind,
    pub amount: f64,
    pub amount_in_words: String,
    pub description: String,
    pub date: String,
    pub counterparty: String,
    pub building_name: String,
}

impl Receipt {
    pub fn from_entry(entry: &LedgerEntry, building_name: &str) -> Self {
        let counterparty = entry
            .resident_name
            .clone()
            .unwrap_or_else(|| entry.category.clone());
        Self {
            kind: entry.kind,
            amount: entry.amount,
            amount_in_words: amount_in_words(entry.amount),
            description: entry.description.clone(),
            date: entry.date.clone(),
            counterparty,
            building_name: building_name.to_string(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            EntryKind::Income => "PARA MAKBUZU",
            EntryKind::Expense => "GİDER PUSULASI",
        }
    }

    pub fn series(&self) -> char {
        match self.kind {
            EntryKind::Income => 'A',
            EntryKind::Expense => 'B',
        }
    }
}

const ONES: [&str; 10] = ["", "BİR", "İKİ", "ÜÇ", "DÖRT", "BEŞ", "ALTI", "YEDİ", "SEKİZ", "DOKUZ"];
const TENS: [&str; 10] = ["", "ON", "YİRMİ", "OTUZ", "KIRK", "ELLİ", "ALTMIŞ", "YETMİŞ", "SEKSEN", "DOKSAN"];
const SCALES: [&str; 4] = ["", "BİN", "MİLYON", "MİLYAR"];

/// Lira amount written out in Turkish capitals, as printed on receipts.
/// Kuruş are appended in digits.
pub fn amount_in_words(value: f64) -> String {
    let total_kurus = (value.abs() * 100.0).round() as u64;
    let mut lira = total_kurus / 100;
    let kurus = total_kurus % 100;
    if lira == 0 {
        return "SIFIR".to_string();
    }

    let mut words = String::new();
    let mut scale = 0;
    while lira > 0 && scale < SCALES.len() {
        let chunk = (lira % 1000) as usize;
        if chunk != 0 {
            let mut part = String::new();
            if chunk == 1 && scale == 1 {
                part.push_str("BİN");
            } else {
                let (h, t, o) = (chunk / 100, (chunk % 100) / 10, chunk % 10);
                if h > 0 {
                    if h > 1 {
                        part.push_str(ONES[h]);
                    }
                    part.push_str("YÜZ");
                }
                part.push_str(TENS[t]);
                part.push_str(ONES[o]);
                part.push_str(SCALES[scale]);
            }
            words.insert_str(0, &part);
        }
        lira /= 1000;
        scale += 1;
    }

    if kurus > 0 {
        words.push_str(&format!(" NOKTA {kurus} KURUŞ"));
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntrySource;
    use crate::scope::testing::*;
    use crate::summary::SummaryField;

    #[test]
    fn test_csv_has_bom_semicolons_and_turkish_numbers() {
        let table = Table {
            title: "Deneme".into(),
            headers: vec!["Ad".into(), "Tutar".into()],
            rows: vec![vec!["Ali; Veli".into(), 1234.5.into()]],
        };
        let mut buf = Vec::new();
        write_csv(&table, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with('\u{FEFF}'));
        let lines: Vec<&str> = text.trim_start_matches('\u{FEFF}').lines().collect();
        assert_eq!(lines[0], "Deneme");
        assert_eq!(lines[1], "Ad;Tutar");
        assert_eq!(lines[2], "\"Ali; Veli\";1.234,50");
    }

    #[test]
    fn test_dues_table_includes_extra_columns() {
        let (_dir, mut scope) = scope();
        add(&mut scope, 1, "Ali");
        scope.add_extra_fee_column("Yakıt").unwrap();
        scope.update_extra_fee(1, "Yakıt", 100.0).unwrap();
        scope.update_dues_payment(1, Month::Ocak, 750.0).unwrap();

        let table = dues_table(&scope.state);
        assert_eq!(table.headers.len(), 3 + 12 + 1 + 3);
        assert_eq!(table.headers[15], "Yakıt");
        let row = &table.rows[0];
        assert_eq!(row[3], Cell::Number(750.0));
        assert_eq!(row[15], Cell::Number(100.0));
        assert_eq!(row[17], Cell::Number(850.0));
    }

    #[test]
    fn test_icmal_table_has_opening_and_totals() {
        let (_dir, mut scope) = scope();
        scope.update_summary_row(None, SummaryField::Income, 1000.0).unwrap();
        let table = icmal_table(&scope.state, &scope.icmal());
        assert_eq!(table.rows.len(), 14);
        assert_eq!(table.rows[0][1], Cell::Number(1000.0));
        assert_eq!(table.rows[13][0], Cell::Text("TOPLAM".into()));
        assert_eq!(table.rows[13][6], Cell::Number(1000.0));
    }

    #[test]
    fn test_receipt_from_dues_row() {
        let entry = LedgerEntry {
            id: 1,
            date: "05.01.2025".into(),
            description: "Ali (D:1) - OCAK Aidatı".into(),
            category: "Aidat Ödemesi".into(),
            amount: 1250.5,
            kind: EntryKind::Income,
            source: Some(EntrySource::DuesPayment { apartment: 1, month: Month::Ocak }),
            apartment: Some(1),
            resident_name: Some("Ali".into()),
        };
        let receipt = Receipt::from_entry(&entry, "Lale Apt.");
        assert_eq!(receipt.title(), "PARA MAKBUZU");
        assert_eq!(receipt.series(), 'A');
        assert_eq!(receipt.counterparty, "Ali");
        assert_eq!(receipt.amount_in_words, "BİNİKİYÜZELLİ NOKTA 50 KURUŞ");
    }

    #[test]
    fn test_amount_in_words() {
        assert_eq!(amount_in_words(0.0), "SIFIR");
        assert_eq!(amount_in_words(750.0), "YEDİYÜZELLİ");
        assert_eq!(amount_in_words(2_001_100.0), "İKİMİLYONBİNYÜZ");
        assert_eq!(amount_in_words(17500.0), "ONYEDİBİNBEŞYÜZ");
    }
}
