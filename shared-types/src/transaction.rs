use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Direction of money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("Unknown transaction type: {}", other)),
        }
    }
}

/// A transaction as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub family_id: Option<i64>,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "crate::dates::lenient_date")]
    #[ts(type = "string")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Transaction body sent on creation (no id yet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct NewTransaction {
    pub user_id: i64,
    pub amount: f64,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub description: Option<String>,
    #[ts(type = "string")]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTransactionResponse {
    pub success: bool,
    #[serde(default)]
    pub transaction_id: Option<i64>,
}

/// Generic `{ success }` acknowledgement used by delete/update endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

/// Query filter for `GET /api/transactions`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct TransactionFilter {
    pub limit: Option<u32>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub date: Option<String>,
}

impl TransactionFilter {
    pub fn recent(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Query pairs in backend order, `user_id` excluded.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(kind) = self.kind {
            pairs.push(("type", kind.to_string()));
        }
        if let Some(category) = self.category.as_ref().filter(|c| !c.is_empty()) {
            pairs.push(("category", category.clone()));
        }
        if let Some(date) = self.date.as_ref().filter(|d| !d.is_empty()) {
            pairs.push(("date", date.clone()));
        }
        pairs
    }
}
