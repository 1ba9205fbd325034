pub mod client;
pub mod error;

pub use client::{FinanceApiClient, RequestOptions, USER_ID_HEADER};
pub use error::ApiError;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared_types::{
    Budget, Category, CategoryReport, CreateTransactionResponse, Family, FamilyMember,
    FamilyResponse, MonthlyReport, NewTransaction, Notification, SuccessResponse, SyncResponse,
    Transaction, TransactionFilter, TransactionKind,
};

/// Operations the dashboard needs from the finance backend.
///
/// `FinanceApiClient` is the HTTP implementation; controller and sync
/// manager only see this trait so they can run against an in-memory backend.
#[async_trait]
pub trait FinanceBackend: Send + Sync {
    async fn get_transactions(&self, filter: &TransactionFilter)
        -> Result<Vec<Transaction>, ApiError>;
    async fn add_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> Result<CreateTransactionResponse, ApiError>;
    async fn delete_transaction(&self, transaction_id: i64) -> Result<SuccessResponse, ApiError>;

    async fn get_monthly_report(&self) -> Result<MonthlyReport, ApiError>;
    async fn get_category_report(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<CategoryReport, ApiError>;

    async fn get_family(&self) -> Result<Option<Family>, ApiError>;
    async fn create_family(&self, family_name: &str) -> Result<FamilyResponse, ApiError>;
    async fn join_family(&self, invite_code: &str) -> Result<FamilyResponse, ApiError>;
    async fn get_family_members(&self) -> Result<Vec<FamilyMember>, ApiError>;

    async fn sync(&self, last_sync: Option<&str>) -> Result<SyncResponse, ApiError>;

    async fn get_budgets(&self) -> Result<Vec<Budget>, ApiError>;
    async fn set_budget(
        &self,
        category: &str,
        amount_limit: f64,
        period: &str,
    ) -> Result<SuccessResponse, ApiError>;

    async fn get_categories(
        &self,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Category>, ApiError>;

    async fn get_notifications(&self) -> Result<Vec<Notification>, ApiError>;
    async fn mark_notification_read(
        &self,
        notification_id: i64,
    ) -> Result<SuccessResponse, ApiError>;
}
