use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::TransactionKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Budget {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_id: i64,
    pub category: String,
    pub amount_limit: f64,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spent: Option<f64>,
}

pub fn default_period() -> String {
    "monthly".to_string()
}

/// Category as configured on the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Category {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Notification {
    pub id: i64,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}
