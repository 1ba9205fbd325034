use shared_types::{
    Budget, CategoryReport, Family, FamilyMember, MonthlyReport, Notification, SyncUpdates,
    Transaction,
};
use std::collections::{HashSet, VecDeque};

use crate::jobs::sync_manager::SyncStatus;
use crate::storage::{KeyValueStore, StorageError, USER_ID_KEY};

/// Toasts kept around before the oldest is dropped
const MAX_NOTICES: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum UserContextError {
    #[error("User ID not found")]
    Missing,

    #[error("Stored user ID is not numeric: {0}")]
    Invalid(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Identity of the signed-in user, fixed for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: i64,
}

impl UserContext {
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, UserContextError> {
        let raw = store.get(USER_ID_KEY)?.ok_or(UserContextError::Missing)?;
        let user_id = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| UserContextError::Invalid(raw.clone()))?;
        Ok(Self { user_id })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// Transient message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Everything the dashboard shows. Mutated only by the app controller and
/// the sync manager.
#[derive(Debug)]
pub struct AppState {
    pub user: UserContext,
    pub recent_transactions: Vec<Transaction>,
    pub transactions: Vec<Transaction>,
    pub monthly_report: Option<MonthlyReport>,
    pub category_report: Option<CategoryReport>,
    pub family: Option<Family>,
    pub family_members: Vec<FamilyMember>,
    pub budgets: Vec<Budget>,
    pub notifications: Vec<Notification>,
    pub sync_status: SyncStatus,
    pub highlight: Option<i64>,
    notices: VecDeque<Notice>,
}

impl AppState {
    pub fn new(user: UserContext) -> Self {
        Self {
            user,
            recent_transactions: Vec::new(),
            transactions: Vec::new(),
            monthly_report: None,
            category_report: None,
            family: None,
            family_members: Vec::new(),
            budgets: Vec::new(),
            notifications: Vec::new(),
            sync_status: SyncStatus::Idle,
            highlight: None,
            notices: VecDeque::new(),
        }
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice {
            level,
            message: message.into(),
        };
        tracing::debug!("Notice ({:?}): {}", notice.level, notice.message);
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Merges a sync delta. Returns how many of the rows were not already known.
    pub fn apply_sync_updates(&mut self, updates: &SyncUpdates) -> usize {
        let known: HashSet<i64> = self.recent_transactions.iter().map(|t| t.id).collect();
        let mut fresh: Vec<Transaction> = updates
            .transactions
            .iter()
            .filter(|t| !known.contains(&t.id))
            .cloned()
            .collect();
        let received = fresh.len();

        if received > 0 {
            fresh.extend(self.recent_transactions.drain(..));
            fresh.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
            self.recent_transactions = fresh;

            self.notify(
                NoticeLevel::Info,
                format!("Получено {} новых транзакций", received),
            );
        }

        if updates.has_family_changes() {
            self.notify(NoticeLevel::Info, "Обновлены данные семьи");
        }

        received
    }
}
