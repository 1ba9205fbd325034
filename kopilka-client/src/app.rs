//! Dashboard controller: owns the application state and wires user actions,
//! page loads and the sync loop to the backend.

use chrono::NaiveDate;
use shared_types::{TransactionFilter, TransactionKind};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::api::{ApiError, FinanceBackend};
use crate::config::SyncSettings;
use crate::jobs::{BackoffPolicy, PageLoader, SyncManager, SyncOutcome};
use crate::modal::{TransactionForm, TransactionModal, ValidationError};
use crate::navigation::{Navigator, Page};
use crate::state::{AppState, NoticeLevel, UserContext, UserContextError};
use crate::storage::KeyValueStore;

/// Rows shown in the dashboard's recent list
pub const RECENT_LIMIT: u32 = 10;

const FILTER_ALL: &str = "all";

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Ошибка сохранения: {0}")]
    Api(#[from] ApiError),

    #[error("Ошибка сохранения")]
    Rejected,
}

pub struct App {
    backend: Arc<dyn FinanceBackend>,
    state: Arc<RwLock<AppState>>,
    sync: Arc<SyncManager>,
    navigator: Navigator,
    modal: TransactionModal,
    filter: TransactionFilter,
    pages: PageLoader,
    refresh_task: Option<JoinHandle<()>>,
}

impl App {
    /// Builds the controller for the user stored in `store`.
    pub fn new(
        backend: Arc<dyn FinanceBackend>,
        store: Arc<dyn KeyValueStore>,
        sync_settings: &SyncSettings,
    ) -> Result<Self, UserContextError> {
        let user = UserContext::load(store.as_ref())?;
        tracing::info!("Starting dashboard for user {}", user.user_id);

        let state = Arc::new(RwLock::new(AppState::new(user)));
        let sync = Arc::new(SyncManager::new(
            backend.clone(),
            store,
            state.clone(),
            BackoffPolicy::from(sync_settings),
        ));

        Ok(Self {
            backend,
            state,
            sync,
            navigator: Navigator::new(),
            modal: TransactionModal::new(),
            filter: TransactionFilter::default(),
            pages: PageLoader::new(),
            refresh_task: None,
        })
    }

    pub fn state(&self) -> Arc<RwLock<AppState>> {
        self.state.clone()
    }

    pub fn sync_manager(&self) -> Arc<SyncManager> {
        self.sync.clone()
    }

    pub async fn user_id(&self) -> i64 {
        self.state.read().await.user.user_id
    }

    /// Loads the dashboard, then starts the sync loop and the listener that
    /// reloads the dashboard when a sync brings new data.
    pub async fn init(&mut self) {
        self.load_dashboard().await;
        self.start_sync().await;
    }

    pub async fn start_sync(&mut self) {
        self.sync.start().await;

        if self.refresh_task.is_none() {
            let refresh = self.sync.refresh_signal();
            let backend = self.backend.clone();
            let state = self.state.clone();
            self.refresh_task = Some(tokio::spawn(async move {
                loop {
                    refresh.notified().await;
                    tracing::debug!("Reloading dashboard after sync");
                    load_dashboard(backend.as_ref(), &state).await;
                }
            }));
        }
    }

    pub async fn load_dashboard(&self) {
        load_dashboard(self.backend.as_ref(), &self.state).await;
    }

    pub fn active_page(&self) -> Page {
        self.navigator.active()
    }

    /// Nav click. Unknown names keep the current page and start no load.
    pub async fn navigate(&mut self, name: &str) -> Option<Page> {
        let page = self.navigator.navigate(name)?;
        self.load_page(page).await;
        Some(page)
    }

    pub async fn on_fragment_change(&mut self, fragment: &str) -> Option<Page> {
        let page = self.navigator.on_fragment_change(fragment)?;
        self.load_page(page).await;
        Some(page)
    }

    async fn load_page(&self, page: Page) {
        let backend = self.backend.clone();
        let state = self.state.clone();
        let filter = self.filter.clone();
        self.pages
            .load(page, async move {
                load_page_data(page, backend.as_ref(), &state, &filter).await;
            })
            .await;
    }

    /// Waits for the latest page load, if any is still running.
    pub async fn wait_for_page(&self) -> Option<Page> {
        self.pages.wait_current().await
    }

    pub fn modal(&self) -> &TransactionModal {
        &self.modal
    }

    /// Opens the add-transaction modal; the type defaults to income.
    pub fn open_modal(&mut self, kind: Option<TransactionKind>, today: NaiveDate) {
        self.modal
            .open(kind.unwrap_or(TransactionKind::Income), today);
    }

    pub fn set_modal_kind(&mut self, kind: TransactionKind) {
        self.modal.set_kind(kind);
    }

    pub fn close_modal(&mut self) {
        self.modal.close();
    }

    /// Validates and submits the form. Returns the new transaction id.
    pub async fn save_transaction(
        &mut self,
        form: &TransactionForm,
        today: NaiveDate,
    ) -> Result<i64, SubmitError> {
        let user_id = self.user_id().await;
        let transaction = match form.validate(user_id, today) {
            Ok(transaction) => transaction,
            Err(e) => {
                self.state
                    .write()
                    .await
                    .notify(NoticeLevel::Error, e.to_string());
                return Err(e.into());
            }
        };

        let response = match self.backend.add_transaction(&transaction).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Error saving transaction: {}", e);
                self.state
                    .write()
                    .await
                    .notify(NoticeLevel::Error, "Ошибка сохранения");
                return Err(e.into());
            }
        };

        let transaction_id = match (response.success, response.transaction_id) {
            (true, Some(id)) => id,
            _ => {
                self.state
                    .write()
                    .await
                    .notify(NoticeLevel::Error, "Ошибка сохранения");
                return Err(SubmitError::Rejected);
            }
        };

        self.modal.close();
        {
            let mut state = self.state.write().await;
            state.highlight = Some(transaction_id);
            state.notify(NoticeLevel::Success, "Транзакция сохранена!");
        }
        self.load_dashboard().await;

        tracing::info!("Saved transaction {}", transaction_id);
        Ok(transaction_id)
    }

    pub async fn delete_transaction(&self, transaction_id: i64) -> bool {
        let deleted = match self.backend.delete_transaction(transaction_id).await {
            Ok(response) => response.success,
            Err(e) => {
                tracing::error!("Error deleting transaction {}: {}", transaction_id, e);
                false
            }
        };

        let mut state = self.state.write().await;
        if deleted {
            state.recent_transactions.retain(|t| t.id != transaction_id);
            state.transactions.retain(|t| t.id != transaction_id);
            state.notify(NoticeLevel::Success, "Транзакция удалена");
        } else {
            state.notify(NoticeLevel::Error, "Ошибка удаления");
        }
        deleted
    }

    pub fn filter(&self) -> &TransactionFilter {
        &self.filter
    }

    /// Applies the transaction page filters; `all` or an empty value clears
    /// a filter. Reloads the transactions page.
    pub async fn apply_filters(&mut self, kind: &str, category: &str, date: &str) {
        let wanted = |value: &str| {
            let value = value.trim();
            (!value.is_empty() && value != FILTER_ALL).then(|| value.to_string())
        };

        self.filter = TransactionFilter {
            limit: None,
            kind: wanted(kind).and_then(|k| match k.parse::<TransactionKind>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    tracing::warn!("Ignoring type filter: {}", e);
                    None
                }
            }),
            category: wanted(category),
            date: wanted(date),
        };

        self.navigator.navigate(Page::Transactions.as_str());
        self.load_page(Page::Transactions).await;
    }

    pub async fn create_family(&self, family_name: &str) -> bool {
        let created = match self.backend.create_family(family_name).await {
            Ok(response) => response.success,
            Err(e) => {
                tracing::error!("Error creating family: {}", e);
                false
            }
        };
        self.after_family_action(created, "Семья создана!", "Ошибка создания семьи")
            .await;
        created
    }

    pub async fn join_family(&self, invite_code: &str) -> bool {
        let joined = match self.backend.join_family(invite_code).await {
            Ok(response) => response.success,
            Err(e) => {
                tracing::error!("Error joining family: {}", e);
                false
            }
        };
        self.after_family_action(joined, "Вы присоединились к семье!", "Неверный код приглашения")
            .await;
        joined
    }

    async fn after_family_action(&self, ok: bool, success: &str, failure: &str) {
        if ok {
            load_page_data(Page::Family, self.backend.as_ref(), &self.state, &self.filter).await;
            self.state.write().await.notify(NoticeLevel::Success, success);
        } else {
            self.state.write().await.notify(NoticeLevel::Error, failure);
        }
    }

    pub async fn set_budget(&self, category: &str, amount_limit: f64, period: &str) -> bool {
        let saved = match self.backend.set_budget(category, amount_limit, period).await {
            Ok(response) => response.success,
            Err(e) => {
                tracing::error!("Error saving budget: {}", e);
                false
            }
        };

        if saved {
            load_page_data(Page::Budget, self.backend.as_ref(), &self.state, &self.filter).await;
            self.state
                .write()
                .await
                .notify(NoticeLevel::Success, "Бюджет сохранен!");
        } else {
            self.state
                .write()
                .await
                .notify(NoticeLevel::Error, "Ошибка сохранения бюджета");
        }
        saved
    }

    pub async fn mark_notification_read(&self, notification_id: i64) {
        match self.backend.mark_notification_read(notification_id).await {
            Ok(_) => {
                let mut state = self.state.write().await;
                for notification in state
                    .notifications
                    .iter_mut()
                    .filter(|n| n.id == notification_id)
                {
                    notification.is_read = true;
                }
            }
            Err(e) => tracing::error!("Error marking notification {} read: {}", notification_id, e),
        }
    }

    /// Manual sync trigger
    pub async fn sync_now(&self) -> SyncOutcome {
        self.sync.sync_now().await
    }

    pub async fn shutdown(&mut self) {
        self.pages.cancel().await;
        self.sync.stop().await;
        if let Some(handle) = self.refresh_task.take() {
            handle.abort();
        }
        tracing::info!("Dashboard stopped");
    }
}

/// Monthly report, recent transactions, category report and notifications,
/// fetched concurrently. Each part that fails keeps its previous value.
async fn load_dashboard(backend: &dyn FinanceBackend, state: &RwLock<AppState>) {
    let recent_filter = TransactionFilter::recent(RECENT_LIMIT);
    let (report, recent, categories, notifications) = futures::join!(
        backend.get_monthly_report(),
        backend.get_transactions(&recent_filter),
        backend.get_category_report(None, None),
        backend.get_notifications(),
    );

    let mut state = state.write().await;
    match report {
        Ok(report) => state.monthly_report = Some(report),
        Err(e) => tracing::error!("Error loading monthly report: {}", e),
    }
    match recent {
        Ok(transactions) => state.recent_transactions = transactions,
        Err(e) => tracing::error!("Error loading recent transactions: {}", e),
    }
    match categories {
        Ok(report) => state.category_report = Some(report),
        Err(e) => tracing::error!("Error loading category report: {}", e),
    }
    match notifications {
        Ok(notifications) => state.notifications = notifications,
        Err(e) => tracing::error!("Error loading notifications: {}", e),
    }
}

async fn load_page_data(
    page: Page,
    backend: &dyn FinanceBackend,
    state: &RwLock<AppState>,
    filter: &TransactionFilter,
) {
    match page {
        Page::Dashboard => load_dashboard(backend, state).await,
        Page::Transactions => match backend.get_transactions(filter).await {
            Ok(transactions) => state.write().await.transactions = transactions,
            Err(e) => tracing::error!("Error loading transactions: {}", e),
        },
        Page::Reports => {
            // The monthly line chart is built from the unfiltered history.
            let history = TransactionFilter::default();
            let (report, transactions) = futures::join!(
                backend.get_category_report(None, None),
                backend.get_transactions(&history)
            );
            let mut state = state.write().await;
            match report {
                Ok(report) => state.category_report = Some(report),
                Err(e) => tracing::error!("Error loading reports: {}", e),
            }
            match transactions {
                Ok(transactions) => state.transactions = transactions,
                Err(e) => tracing::error!("Error loading report history: {}", e),
            }
        }
        Page::Family => {
            let (family, members) =
                futures::join!(backend.get_family(), backend.get_family_members());
            let mut state = state.write().await;
            match family {
                Ok(family) => state.family = family,
                Err(e) => tracing::error!("Error loading family: {}", e),
            }
            match members {
                Ok(members) => state.family_members = members,
                Err(e) => tracing::error!("Error loading family members: {}", e),
            }
        }
        Page::Budget => match backend.get_budgets().await {
            Ok(budgets) => state.write().await.budgets = budgets,
            Err(e) => tracing::error!("Error loading budgets: {}", e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BalanceView;
    use crate::storage::{MemoryStore, USER_ID_KEY};
    use crate::testing::{sample_transaction, FakeBackend};
    use std::sync::atomic::Ordering;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn app_with(backend: Arc<FakeBackend>) -> App {
        let store = Arc::new(MemoryStore::with_entries([(USER_ID_KEY, "1")]));
        App::new(backend, store, &SyncSettings::default()).unwrap()
    }

    fn form(kind: TransactionKind, amount: &str, category: &str) -> TransactionForm {
        TransactionForm {
            kind,
            amount: amount.to_string(),
            category: category.to_string(),
            description: String::new(),
            date: Some(today()),
        }
    }

    #[test]
    fn test_missing_user_is_an_error() {
        let result = App::new(
            Arc::new(FakeBackend::new()),
            Arc::new(MemoryStore::new()),
            &SyncSettings::default(),
        );
        assert!(matches!(result, Err(UserContextError::Missing)));
    }

    #[tokio::test]
    async fn test_seeded_transactions_render_balance() {
        let backend = Arc::new(FakeBackend::new());
        let mut app = app_with(backend.clone());

        let income = app
            .save_transaction(&form(TransactionKind::Income, "1000", "Зарплата"), today())
            .await
            .unwrap();
        app.save_transaction(&form(TransactionKind::Expense, "300", "Еда"), today())
            .await
            .unwrap();

        let state = app.state();
        let state = state.read().await;
        let view = BalanceView::from(state.monthly_report.as_ref().unwrap());
        assert_eq!(view.balance, "700 ₽");
        assert_eq!(view.income, "1\u{a0}000 ₽");
        assert_eq!(view.expense, "300 ₽");

        assert_eq!(state.recent_transactions.len(), 2);
        assert!(state.recent_transactions.iter().any(|t| t.id == income));
    }

    #[tokio::test]
    async fn test_save_flags_new_transaction_and_closes_modal() {
        let backend = Arc::new(FakeBackend::new());
        let mut app = app_with(backend);

        app.open_modal(None, today());
        assert_eq!(app.modal().kind(), Some(TransactionKind::Income));
        app.set_modal_kind(TransactionKind::Expense);

        let mut form = app.modal().blank_form().unwrap();
        form.amount = "250".to_string();
        form.category = "Транспорт".to_string();

        let id = app.save_transaction(&form, today()).await.unwrap();
        assert!(!app.modal().is_open());

        let state = app.state();
        let mut state = state.write().await;
        assert_eq!(state.highlight, Some(id));
        let notices = state.drain_notices();
        assert_eq!(notices.last().unwrap().message, "Транзакция сохранена!");
        assert_eq!(notices.last().unwrap().level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn test_invalid_form_makes_no_network_call() {
        let backend = Arc::new(FakeBackend::new());
        let mut app = app_with(backend.clone());
        app.open_modal(Some(TransactionKind::Expense), today());

        let err = app
            .save_transaction(&form(TransactionKind::Expense, "-10", "Еда"), today())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(ValidationError::InvalidAmount)));

        let err = app
            .save_transaction(&form(TransactionKind::Expense, "10", ""), today())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(ValidationError::MissingCategory)));

        assert!(backend.calls().is_empty());
        assert!(app.modal().is_open());

        let state = app.state();
        let notices = state.write().await.drain_notices();
        assert_eq!(notices[0].message, "Укажите сумму");
        assert_eq!(notices[1].message, "Выберите категорию");
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_notice() {
        let backend = Arc::new(FakeBackend::new());
        backend.fail_writes.store(true, Ordering::SeqCst);
        let mut app = app_with(backend);

        let err = app
            .save_transaction(&form(TransactionKind::Income, "10", "Подарки"), today())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Api(_)));

        let state = app.state();
        let notices = state.write().await.drain_notices();
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "Ошибка сохранения");
    }

    #[tokio::test]
    async fn test_dashboard_parts_fail_independently() {
        let backend = Arc::new(FakeBackend::with_transactions(vec![sample_transaction(
            1,
            TransactionKind::Expense,
            50.0,
            "Еда",
        )]));
        backend.fail_reports.store(true, Ordering::SeqCst);
        let app = app_with(backend);

        app.load_dashboard().await;

        let state = app.state();
        let state = state.read().await;
        assert!(state.monthly_report.is_none());
        assert!(state.category_report.is_none());
        assert_eq!(state.recent_transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_navigation_loads_page_data() {
        let backend = Arc::new(FakeBackend::new());
        let mut app = app_with(backend.clone());

        assert_eq!(app.navigate("budget").await, Some(Page::Budget));
        assert_eq!(app.wait_for_page().await, Some(Page::Budget));
        assert_eq!(backend.count_calls("get_budgets"), 1);

        assert_eq!(app.navigate("settings").await, None);
        assert_eq!(app.active_page(), Page::Budget);
        assert_eq!(app.wait_for_page().await, None);

        assert_eq!(app.on_fragment_change("#family").await, Some(Page::Family));
        app.wait_for_page().await;
        assert_eq!(backend.count_calls("get_family"), 1);
    }

    #[tokio::test]
    async fn test_reports_page_loads_history() {
        let backend = Arc::new(FakeBackend::with_transactions(vec![
            sample_transaction(1, TransactionKind::Expense, 50.0, "Еда"),
            sample_transaction(2, TransactionKind::Income, 500.0, "Зарплата"),
        ]));
        let mut app = app_with(backend.clone());

        assert_eq!(app.navigate("reports").await, Some(Page::Reports));
        app.wait_for_page().await;
        assert_eq!(backend.count_calls("get_category_report"), 1);

        let state = app.state();
        let state = state.read().await;
        assert!(state.category_report.is_some());
        assert_eq!(state.transactions.len(), 2);
    }

    #[tokio::test]
    async fn test_filters_treat_all_as_unset() {
        let backend = Arc::new(FakeBackend::with_transactions(vec![
            sample_transaction(1, TransactionKind::Expense, 50.0, "Еда"),
            sample_transaction(2, TransactionKind::Income, 500.0, "Зарплата"),
        ]));
        let mut app = app_with(backend);

        app.apply_filters("expense", "all", "").await;
        app.wait_for_page().await;
        assert_eq!(app.active_page(), Page::Transactions);
        assert_eq!(app.filter().kind, Some(TransactionKind::Expense));
        assert!(app.filter().category.is_none());
        assert_eq!(app.state().read().await.transactions.len(), 1);

        app.apply_filters("all", "all", "all").await;
        app.wait_for_page().await;
        assert_eq!(app.filter(), &TransactionFilter::default());
        assert_eq!(app.state().read().await.transactions.len(), 2);
    }

    #[tokio::test]
    async fn test_family_and_budget_actions() {
        let backend = Arc::new(FakeBackend::new());
        let app = app_with(backend);

        assert!(!app.join_family("WRONG").await);
        assert!(app.create_family("Ивановы").await);
        assert!(app.set_budget("Еда", 15000.0, "monthly").await);

        let state = app.state();
        let state = state.read().await;
        assert_eq!(state.family.as_ref().unwrap().name, "Ивановы");
        assert_eq!(state.family_members.len(), 1);
        assert_eq!(state.budgets[0].amount_limit, 15000.0);
    }

    #[tokio::test]
    async fn test_init_and_shutdown() {
        let backend = Arc::new(FakeBackend::new());
        let mut app = app_with(backend.clone());

        app.init().await;
        assert!(app.state().read().await.monthly_report.is_some());
        assert!(app.sync_manager().is_running().await);

        app.shutdown().await;
        assert!(!app.sync_manager().is_running().await);
    }
}
