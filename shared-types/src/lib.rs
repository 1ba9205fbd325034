use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod budget;
pub mod dates;
pub mod family;
pub mod report;
pub mod sync;
pub mod transaction;

pub use budget::{Budget, Category, Notification};
pub use family::{Family, FamilyMember, FamilyRequest, FamilyResponse};
pub use report::{CategoryReport, CategoryTotal, MonthlyReport};
pub use sync::{SyncRequest, SyncResponse, SyncUpdates};
pub use transaction::{
    CreateTransactionResponse, NewTransaction, SuccessResponse, Transaction, TransactionFilter,
    TransactionKind,
};

/// Error response for API endpoints
#[derive(Debug, Serialize, Deserialize, TS)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of `GET /health` on the bot server
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct HealthResponse {
    pub status: String,
    pub hosting: String,
    pub time: String,
}
