//! Pure mapping from backend JSON to display fragments.
//!
//! Every function here is total: unknown categories fall back to a neutral
//! color and a receipt icon instead of failing.

pub mod charts;
pub mod format;

pub use format::{format_amount, format_date, format_number};

use shared_types::{MonthlyReport, Transaction, TransactionKind};
use std::fmt;

use crate::jobs::sync_manager::SyncStatus;

pub const DEFAULT_CATEGORY_COLOR: &str = "#6c757d";
pub const DEFAULT_CATEGORY_ICON: &str = "fa-receipt";
pub const EMPTY_STATE_TEXT: &str = "Нет транзакций";

pub fn category_color(category: &str) -> &'static str {
    match category {
        "Еда" => "#4cc9f0",
        "Транспорт" => "#7209b7",
        "Жилье" => "#f8961e",
        "Развлечения" => "#f72585",
        "Здоровье" => "#38b000",
        "Образование" => "#4361ee",
        "Зарплата" => "#4caf50",
        "Инвестиции" => "#9c27b0",
        _ => DEFAULT_CATEGORY_COLOR,
    }
}

pub fn category_icon(category: &str) -> &'static str {
    match category {
        "Еда" => "fa-utensils",
        "Транспорт" => "fa-car",
        "Жилье" => "fa-home",
        "Развлечения" => "fa-film",
        "Здоровье" => "fa-heart",
        "Образование" => "fa-graduation-cap",
        "Зарплата" => "fa-money-bill-wave",
        "Инвестиции" => "fa-chart-line",
        _ => DEFAULT_CATEGORY_ICON,
    }
}

/// One row of a transaction list
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionView {
    pub id: i64,
    pub category: String,
    pub description: String,
    pub amount_text: String,
    pub amount_class: &'static str,
    pub direction_icon: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub date_text: String,
    pub is_new: bool,
}

impl fmt::Display for TransactionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_new { "*" } else { " " };
        write!(
            f,
            "{} {:>8}  {:<14} {:>16}",
            marker, self.date_text, self.category, self.amount_text
        )?;
        if !self.description.is_empty() {
            write!(f, "  {}", self.description)?;
        }
        Ok(())
    }
}

pub fn format_transaction(transaction: &Transaction) -> TransactionView {
    let is_income = transaction.kind == TransactionKind::Income;
    let sign = if is_income { "+" } else { "-" };

    TransactionView {
        id: transaction.id,
        category: transaction.category.clone(),
        description: transaction.description.clone().unwrap_or_default(),
        amount_text: format!("{}{}", sign, format_amount(transaction.amount)),
        amount_class: if is_income { "income" } else { "expense" },
        direction_icon: if is_income { "fa-arrow-up" } else { "fa-arrow-down" },
        color: category_color(&transaction.category),
        icon: category_icon(&transaction.category),
        date_text: format_date(transaction.date),
        is_new: false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionList {
    Empty,
    Items(Vec<TransactionView>),
}

impl fmt::Display for TransactionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionList::Empty => write!(f, "{}", EMPTY_STATE_TEXT),
            TransactionList::Items(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

/// Renders a list, flagging `highlight` as freshly added.
pub fn render_transactions(transactions: &[Transaction], highlight: Option<i64>) -> TransactionList {
    if transactions.is_empty() {
        return TransactionList::Empty;
    }

    TransactionList::Items(
        transactions
            .iter()
            .map(|tx| {
                let mut view = format_transaction(tx);
                view.is_new = highlight == Some(tx.id);
                view
            })
            .collect(),
    )
}

/// Balance card texts
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceView {
    pub balance: String,
    pub income: String,
    pub expense: String,
}

impl From<&MonthlyReport> for BalanceView {
    fn from(report: &MonthlyReport) -> Self {
        Self {
            balance: format_amount(report.balance),
            income: format_amount(report.total_income),
            expense: format_amount(report.total_expense),
        }
    }
}

impl fmt::Display for BalanceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Баланс: {}\nДоходы: {}\nРасходы: {}",
            self.balance, self.income, self.expense
        )
    }
}

pub fn sync_status_text(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Synced => "онлайн",
        SyncStatus::Syncing => "синхронизация...",
        SyncStatus::Error => "ошибка",
        SyncStatus::Idle => "неизвестно",
    }
}
