//! In-memory `FinanceBackend` for unit tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use shared_types::{
    Budget, Category, CategoryReport, CategoryTotal, CreateTransactionResponse, Family,
    FamilyMember, FamilyResponse, MonthlyReport, NewTransaction, Notification, SuccessResponse,
    SyncResponse, SyncUpdates, Transaction, TransactionFilter, TransactionKind,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::api::{ApiError, FinanceBackend};

pub fn sample_transaction(id: i64, kind: TransactionKind, amount: f64, category: &str) -> Transaction {
    Transaction {
        id,
        user_id: 1,
        family_id: None,
        amount,
        kind,
        category: category.to_string(),
        description: None,
        date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        username: None,
    }
}

pub enum SyncScript {
    Respond(SyncResponse),
    Fail(u16),
}

/// Lets a test hold a sync call open until it decides to release it.
#[derive(Clone, Default)]
pub struct SyncGate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
pub struct FakeBackend {
    transactions: Mutex<Vec<Transaction>>,
    sync_script: Mutex<VecDeque<SyncScript>>,
    seen_watermarks: Mutex<Vec<Option<String>>>,
    calls: Mutex<Vec<&'static str>>,
    budgets: Mutex<Vec<Budget>>,
    family: Mutex<Option<Family>>,
    gate: Mutex<Option<SyncGate>>,
    sync_calls: AtomicUsize,
    next_id: AtomicI64,
    pub fail_reports: AtomicBool,
    pub fail_writes: AtomicBool,
}

fn server_error(status: u16) -> ApiError {
    ApiError::Request {
        status,
        status_text: "Internal Server Error".to_string(),
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            ..Self::default()
        }
    }

    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        let backend = Self::new();
        *backend.transactions.lock().unwrap() = transactions;
        backend
    }

    pub fn script_sync(&self, step: SyncScript) {
        self.sync_script.lock().unwrap().push_back(step);
    }

    pub fn hold_sync(&self) -> SyncGate {
        let gate = SyncGate::default();
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn seen_watermarks(&self) -> Vec<Option<String>> {
        self.seen_watermarks.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn check_reports(&self) -> Result<(), ApiError> {
        if self.fail_reports.load(Ordering::SeqCst) {
            return Err(server_error(500));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), ApiError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(server_error(500));
        }
        Ok(())
    }

    fn category_totals(&self, kind: TransactionKind) -> Vec<CategoryTotal> {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for tx in self.transactions.lock().unwrap().iter().filter(|t| t.kind == kind) {
            *totals.entry(tx.category.clone()).or_default() += tx.amount;
        }
        totals
            .into_iter()
            .map(|(category, total)| CategoryTotal::new(category, total))
            .collect()
    }
}

#[async_trait]
impl FinanceBackend for FakeBackend {
    async fn get_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, ApiError> {
        self.record("get_transactions");
        let mut rows: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| filter.kind.map_or(true, |kind| t.kind == kind))
            .filter(|t| filter.category.as_ref().map_or(true, |c| &t.category == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn add_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> Result<CreateTransactionResponse, ApiError> {
        self.record("add_transaction");
        self.check_writes()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.transactions.lock().unwrap().push(Transaction {
            id,
            user_id: transaction.user_id,
            family_id: None,
            amount: transaction.amount,
            kind: transaction.kind,
            category: transaction.category.clone(),
            description: transaction.description.clone(),
            date: transaction.date,
            username: None,
        });
        Ok(CreateTransactionResponse {
            success: true,
            transaction_id: Some(id),
        })
    }

    async fn delete_transaction(&self, transaction_id: i64) -> Result<SuccessResponse, ApiError> {
        self.record("delete_transaction");
        self.check_writes()?;
        let mut rows = self.transactions.lock().unwrap();
        let before = rows.len();
        rows.retain(|t| t.id != transaction_id);
        Ok(SuccessResponse {
            success: rows.len() != before,
        })
    }

    async fn get_monthly_report(&self) -> Result<MonthlyReport, ApiError> {
        self.record("get_monthly_report");
        self.check_reports()?;
        let rows = self.transactions.lock().unwrap().clone();
        let total_income: f64 = rows
            .iter()
            .filter(|t| t.kind == TransactionKind::Income)
            .map(|t| t.amount)
            .sum();
        let total_expense: f64 = rows
            .iter()
            .filter(|t| t.kind == TransactionKind::Expense)
            .map(|t| t.amount)
            .sum();
        Ok(MonthlyReport {
            balance: total_income - total_expense,
            total_income,
            total_expense,
            categories: self.category_totals(TransactionKind::Expense),
        })
    }

    async fn get_category_report(
        &self,
        _start_date: Option<NaiveDate>,
        _end_date: Option<NaiveDate>,
    ) -> Result<CategoryReport, ApiError> {
        self.record("get_category_report");
        self.check_reports()?;
        Ok(CategoryReport {
            categories: self.category_totals(TransactionKind::Expense),
        })
    }

    async fn get_family(&self) -> Result<Option<Family>, ApiError> {
        self.record("get_family");
        Ok(self.family.lock().unwrap().clone())
    }

    async fn create_family(&self, family_name: &str) -> Result<FamilyResponse, ApiError> {
        self.record("create_family");
        self.check_writes()?;
        *self.family.lock().unwrap() = Some(Family {
            id: 1,
            name: family_name.to_string(),
            created_by: Some(1),
            invite_code: Some("ABC123".to_string()),
        });
        Ok(FamilyResponse {
            success: true,
            family_id: Some(1),
        })
    }

    async fn join_family(&self, invite_code: &str) -> Result<FamilyResponse, ApiError> {
        self.record("join_family");
        let joined = invite_code == "ABC123";
        Ok(FamilyResponse {
            success: joined,
            family_id: joined.then_some(1),
        })
    }

    async fn get_family_members(&self) -> Result<Vec<FamilyMember>, ApiError> {
        self.record("get_family_members");
        if self.family.lock().unwrap().is_none() {
            return Ok(Vec::new());
        }
        Ok(vec![FamilyMember {
            id: 1,
            username: Some("anna".to_string()),
            first_name: Some("Анна".to_string()),
        }])
    }

    async fn sync(&self, last_sync: Option<&str>) -> Result<SyncResponse, ApiError> {
        self.record("sync");
        let call = self.sync_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen_watermarks
            .lock()
            .unwrap()
            .push(last_sync.map(str::to_string));

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let step = self.sync_script.lock().unwrap().pop_front();
        match step {
            Some(SyncScript::Respond(response)) => Ok(response),
            Some(SyncScript::Fail(status)) => Err(server_error(status)),
            None => Ok(SyncResponse {
                success: true,
                updates: Some(SyncUpdates::default()),
                server_time: format!("server-time-{}", call),
            }),
        }
    }

    async fn get_budgets(&self) -> Result<Vec<Budget>, ApiError> {
        self.record("get_budgets");
        Ok(self.budgets.lock().unwrap().clone())
    }

    async fn set_budget(
        &self,
        category: &str,
        amount_limit: f64,
        period: &str,
    ) -> Result<SuccessResponse, ApiError> {
        self.record("set_budget");
        self.check_writes()?;
        let mut budgets = self.budgets.lock().unwrap();
        budgets.retain(|b| b.category != category);
        budgets.push(Budget {
            id: None,
            user_id: 1,
            category: category.to_string(),
            amount_limit,
            period: period.to_string(),
            spent: None,
        });
        Ok(SuccessResponse { success: true })
    }

    async fn get_categories(
        &self,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Category>, ApiError> {
        self.record("get_categories");
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => vec![TransactionKind::Income, TransactionKind::Expense],
        };
        Ok(kinds
            .into_iter()
            .flat_map(|kind| {
                crate::modal::suggested_categories(kind)
                    .iter()
                    .map(move |name| Category {
                        id: None,
                        name: name.to_string(),
                        kind,
                        icon: None,
                        color: None,
                    })
            })
            .collect())
    }

    async fn get_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.record("get_notifications");
        self.check_reports()?;
        Ok(vec![Notification {
            id: 1,
            message: "Превышен бюджет: Еда".to_string(),
            is_read: false,
            created_at: None,
        }])
    }

    async fn mark_notification_read(
        &self,
        _notification_id: i64,
    ) -> Result<SuccessResponse, ApiError> {
        self.record("mark_notification_read");
        Ok(SuccessResponse { success: true })
    }
}
