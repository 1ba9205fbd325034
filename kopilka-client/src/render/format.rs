use chrono::{Datelike, NaiveDate};

pub const CURRENCY_SUFFIX: &str = " ₽";

/// ru-RU digit grouping separator (no-break space)
const GROUP_SEPARATOR: char = '\u{00A0}';

const MONTHS_SHORT: [&str; 12] = [
    "янв.", "февр.", "мар.", "апр.", "мая", "июн.", "июл.", "авг.", "сент.", "окт.", "нояб.",
    "дек.",
];

/// Formats a number the way `toLocaleString('ru-RU')` does for money:
/// grouped thousands, comma decimals, at most two fraction digits.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let mut out = String::new();
    if value < 0.0 && cents > 0 {
        out.push('-');
    }
    out.push_str(&group_thousands(whole));
    if fraction > 0 {
        let digits = format!("{:02}", fraction);
        out.push(',');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

pub fn format_amount(value: f64) -> String {
    format!("{}{}", format_number(value), CURRENCY_SUFFIX)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(ch);
    }
    out
}

/// Two-digit day and abbreviated month, e.g. `05 янв.`
pub fn format_date(date: NaiveDate) -> String {
    format!("{:02} {}", date.day(), MONTHS_SHORT[date.month0() as usize])
}
