//! Data series for the dashboard charts. Only the data side lives here;
//! drawing belongs to whatever chart library the front end uses.

use chrono::Datelike;
use shared_types::{CategoryTotal, Transaction, TransactionKind};

use super::format::format_number;

pub const MONTH_LABELS: [&str; 12] = [
    "Янв", "Фев", "Мар", "Апр", "Май", "Июн", "Июл", "Авг", "Сен", "Окт", "Ноя", "Дек",
];

const DOUGHNUT_PALETTE: [&str; 8] = [
    "#4cc9f0", "#7209b7", "#f8961e", "#f72585", "#38b000", "#4361ee", "#9c27b0", "#ff9800",
];

const BASE_PALETTE: [&str; 12] = [
    "#4cc9f0", "#7209b7", "#f8961e", "#f72585", "#38b000", "#4361ee", "#9c27b0", "#ff9800",
    "#00bcd4", "#8bc34a", "#ff5722", "#673ab7",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySeries {
    pub labels: Vec<String>,
    pub amounts: Vec<f64>,
    pub colors: Vec<String>,
    pub border_colors: Vec<String>,
}

impl CategorySeries {
    pub fn total(&self) -> f64 {
        self.amounts.iter().sum()
    }

    /// Tooltip text for slice `index`, e.g. `Еда: 1 500 ₽ (30%)`.
    pub fn tooltip(&self, index: usize) -> Option<String> {
        let label = self.labels.get(index)?;
        let value = *self.amounts.get(index)?;
        Some(tooltip_label(label, value, self.total()))
    }
}

/// Expense doughnut: fixed 8-color palette, white borders.
pub fn expense_doughnut(categories: &[CategoryTotal]) -> CategorySeries {
    CategorySeries {
        labels: categories.iter().map(|c| c.category.clone()).collect(),
        amounts: categories.iter().map(|c| c.total).collect(),
        colors: DOUGHNUT_PALETTE
            .iter()
            .cycle()
            .take(categories.len())
            .map(|c| c.to_string())
            .collect(),
        border_colors: vec!["#ffffff".to_string(); categories.len()],
    }
}

/// Category bar chart: generated palette, borders darkened by 20%.
pub fn category_bars(categories: &[CategoryTotal]) -> CategorySeries {
    let colors = generate_colors(categories.len());
    let border_colors = colors.iter().map(|c| darken_color(c, 20)).collect();
    CategorySeries {
        labels: categories.iter().map(|c| c.category.clone()).collect(),
        amounts: categories.iter().map(|c| c.total).collect(),
        colors,
        border_colors,
    }
}

pub fn tooltip_label(label: &str, value: f64, total: f64) -> String {
    let percentage = if total > 0.0 {
        (value / total * 100.0).round() as i64
    } else {
        0
    };
    format!("{}: {} ₽ ({}%)", label, format_number(value), percentage)
}

pub fn generate_colors(count: usize) -> Vec<String> {
    BASE_PALETTE
        .iter()
        .cycle()
        .take(count)
        .map(|c| c.to_string())
        .collect()
}

/// Darkens `#rrggbb` by `percent`. Anything that is not a 6-digit hex color
/// is returned unchanged.
pub fn darken_color(color: &str, percent: u8) -> String {
    let hex = match color.strip_prefix('#') {
        Some(hex) if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) => hex,
        _ => return color.to_string(),
    };

    let factor = 100u32.saturating_sub(percent.min(100) as u32);
    let channel = |range: std::ops::Range<usize>| -> u32 {
        let value = u32::from_str_radix(&hex[range], 16).unwrap_or(0);
        value * factor / 100
    };

    format!(
        "#{:02x}{:02x}{:02x}",
        channel(0..2),
        channel(2..4),
        channel(4..6)
    )
}

/// Income and expense per calendar month of `year`, for the balance line chart.
pub fn monthly_series(transactions: &[Transaction], year: i32) -> ([f64; 12], [f64; 12]) {
    let mut income = [0.0; 12];
    let mut expense = [0.0; 12];

    for tx in transactions.iter().filter(|tx| tx.date.year() == year) {
        let month = tx.date.month0() as usize;
        match tx.kind {
            TransactionKind::Income => income[month] += tx.amount,
            TransactionKind::Expense => expense[month] += tx.amount,
        }
    }

    (income, expense)
}
