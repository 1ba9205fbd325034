use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Family {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub invite_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct FamilyMember {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl FamilyMember {
    /// Name shown in member lists: first name, then username.
    pub fn display_name(&self) -> String {
        self.first_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.username.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("User_{}", self.id))
    }
}

/// Body of `POST /api/family`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum FamilyRequest {
    Create { user_id: i64, family_name: String },
    Join { user_id: i64, invite_code: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct FamilyResponse {
    pub success: bool,
    #[serde(default)]
    pub family_id: Option<i64>,
}
