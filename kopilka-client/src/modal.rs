use chrono::NaiveDate;
use shared_types::{NewTransaction, TransactionKind};

pub const INCOME_CATEGORIES: [&str; 5] = ["Зарплата", "Фриланс", "Инвестиции", "Подарки", "Прочее"];

pub const EXPENSE_CATEGORIES: [&str; 8] = [
    "Еда",
    "Транспорт",
    "Жилье",
    "Развлечения",
    "Здоровье",
    "Образование",
    "Одежда",
    "Прочее",
];

pub fn suggested_categories(kind: TransactionKind) -> &'static [&'static str] {
    match kind {
        TransactionKind::Income => &INCOME_CATEGORIES,
        TransactionKind::Expense => &EXPENSE_CATEGORIES,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Укажите сумму")]
    InvalidAmount,

    #[error("Выберите категорию")]
    MissingCategory,
}

/// Raw values of the add-transaction form, as typed by the user
#[derive(Debug, Clone)]
pub struct TransactionForm {
    pub kind: TransactionKind,
    pub amount: String,
    pub category: String,
    pub description: String,
    pub date: Option<NaiveDate>,
}

impl TransactionForm {
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            kind,
            amount: String::new(),
            category: String::new(),
            description: String::new(),
            date: None,
        }
    }

    /// Checks the form and builds the request body. No network involved.
    pub fn validate(&self, user_id: i64, today: NaiveDate) -> Result<NewTransaction, ValidationError> {
        let amount = parse_amount(&self.amount).ok_or(ValidationError::InvalidAmount)?;

        let category = self.category.trim();
        if category.is_empty() {
            return Err(ValidationError::MissingCategory);
        }

        let description = self.description.trim();
        Ok(NewTransaction {
            user_id,
            amount,
            category: category.to_string(),
            kind: self.kind,
            description: (!description.is_empty()).then(|| description.to_string()),
            date: self.date.unwrap_or(today),
        })
    }
}

/// Accepts `1500`, `1500.50`, `1 500,50`. Returns `None` unless the value is a
/// finite number above zero.
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let amount = cleaned.parse::<f64>().ok()?;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Closed,
    Open { kind: TransactionKind, date: NaiveDate },
}

/// Add-transaction modal with its income/expense toggle.
#[derive(Debug, Clone)]
pub struct TransactionModal {
    state: ModalState,
}

impl Default for TransactionModal {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionModal {
    pub fn new() -> Self {
        Self {
            state: ModalState::Closed,
        }
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Open { .. })
    }

    pub fn open(&mut self, kind: TransactionKind, today: NaiveDate) {
        self.state = ModalState::Open { kind, date: today };
    }

    /// Switches the type of an open modal; a closed modal stays closed.
    pub fn set_kind(&mut self, kind: TransactionKind) {
        if let ModalState::Open { date, .. } = self.state {
            self.state = ModalState::Open { kind, date };
        }
    }

    pub fn close(&mut self) {
        self.state = ModalState::Closed;
    }

    pub fn kind(&self) -> Option<TransactionKind> {
        match self.state {
            ModalState::Open { kind, .. } => Some(kind),
            ModalState::Closed => None,
        }
    }

    /// Category choices for the current toggle; empty while closed.
    pub fn categories(&self) -> &'static [&'static str] {
        self.kind().map(suggested_categories).unwrap_or(&[])
    }

    /// A blank form prefilled with the current type and date.
    pub fn blank_form(&self) -> Option<TransactionForm> {
        match self.state {
            ModalState::Open { kind, date } => {
                let mut form = TransactionForm::new(kind);
                form.date = Some(date);
                Some(form)
            }
            ModalState::Closed => None,
        }
    }
}
