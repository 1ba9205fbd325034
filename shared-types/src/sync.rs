use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::Transaction;

/// Body of `POST /api/sync`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct SyncRequest {
    pub user_id: i64,
    pub last_sync: Option<String>,
}

/// Delta collections returned by the backend since the watermark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct SyncUpdates {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    #[ts(type = "any")]
    pub family_changes: Option<serde_json::Value>,
}

impl SyncUpdates {
    pub fn has_family_changes(&self) -> bool {
        matches!(&self.family_changes, Some(v) if !v.is_null() && v != &serde_json::Value::Bool(false))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct SyncResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub updates: Option<SyncUpdates>,
    /// Opaque server timestamp, stored verbatim as the next watermark
    pub server_time: String,
}
