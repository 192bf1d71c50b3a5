/// Group the integer part with dots and use a decimal comma: 1.234,56
pub fn amount(val: f64) -> String {
    let negative = val < 0.0 && (val * 100.0).round() != 0.0;
    let kurus = format!("{:.2}", val.abs());
    let (int_part, dec_part) = kurus.split_once('.').unwrap_or((kurus.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-{grouped},{dec_part}")
    } else {
        format!("{grouped},{dec_part}")
    }
}

/// Lira amount for display: 1.234,56 ₺
pub fn money(val: f64) -> String {
    format!("{} ₺", amount(val))
}

/// Like `money`, with an explicit sign on non-negative values.
pub fn signed_money(val: f64) -> String {
    if val < 0.0 {
        money(val)
    } else {
        format!("+{}", money(val))
    }
}

/// Today as dd.mm.yyyy.
pub fn today() -> String {
    chrono::Local::now().format("%d.%m.%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "1.234,56 ₺");
        assert_eq!(money(-500.00), "-500,00 ₺");
        assert_eq!(money(0.0), "0,00 ₺");
        assert_eq!(money(1000000.99), "1.000.000,99 ₺");
        assert_eq!(amount(42.10), "42,10");
        assert_eq!(amount(-0.001), "0,00");
    }

    #[test]
    fn test_signed_money() {
        assert_eq!(signed_money(200.0), "+200,00 ₺");
        assert_eq!(signed_money(-200.0), "-200,00 ₺");
    }

    #[test]
    fn test_today_shape() {
        let t = today();
        assert_eq!(t.len(), 10);
        assert_eq!(&t[2..3], ".");
    }
}
