use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify, RwLock};
use tokio::task::JoinHandle;

use crate::api::FinanceBackend;
use crate::config::SyncSettings;
use crate::state::AppState;
use crate::storage::{KeyValueStore, StorageError, LAST_SYNC_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Syncing,
    Synced,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Updates merged and the watermark advanced to `watermark`.
    Applied { received: usize, watermark: String },
    /// The backend answered without updates; watermark untouched.
    NoUpdates,
    /// Another sync was already in flight.
    Skipped,
    /// The round-trip failed; watermark untouched.
    Failed(String),
}

/// Delay before the next tick given the current failure streak.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
    pub enabled: bool,
}

impl From<&SyncSettings> for BackoffPolicy {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            base: settings.interval(),
            max: settings.max_backoff(),
            enabled: settings.backoff_enabled,
        }
    }
}

impl BackoffPolicy {
    pub fn delay(&self, consecutive_failures: u32) -> Duration {
        if !self.enabled || consecutive_failures == 0 {
            return self.base;
        }
        let factor = 2u32.saturating_pow(consecutive_failures.min(16));
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// Clears the in-flight flag when the sync attempt ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodic and on-demand synchronization against `POST /api/sync`.
///
/// The watermark lives in the key/value store under `last_sync` and only
/// ever takes the value of a server-reported `server_time`.
pub struct SyncManager {
    backend: Arc<dyn FinanceBackend>,
    store: Arc<dyn KeyValueStore>,
    state: Arc<RwLock<AppState>>,
    policy: BackoffPolicy,
    in_flight: AtomicBool,
    consecutive_failures: AtomicU32,
    status_tx: watch::Sender<SyncStatus>,
    refresh: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncManager {
    pub fn new(
        backend: Arc<dyn FinanceBackend>,
        store: Arc<dyn KeyValueStore>,
        state: Arc<RwLock<AppState>>,
        policy: BackoffPolicy,
    ) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        Self {
            backend,
            store,
            state,
            policy,
            in_flight: AtomicBool::new(false),
            consecutive_failures: AtomicU32::new(0),
            status_tx,
            refresh: Arc::new(Notify::new()),
            task: Mutex::new(None),
        }
    }

    pub fn status(&self) -> SyncStatus {
        *self.status_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Fires whenever a sync brought new transactions and the dashboard
    /// should be reloaded.
    pub fn refresh_signal(&self) -> Arc<Notify> {
        self.refresh.clone()
    }

    pub fn last_sync(&self) -> Option<String> {
        self.store.get(LAST_SYNC_KEY).ok().flatten()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    pub fn next_delay(&self) -> Duration {
        self.policy.delay(self.consecutive_failures())
    }

    async fn set_status(&self, status: SyncStatus) {
        self.status_tx.send_replace(status);
        self.state.write().await.sync_status = status;
    }

    async fn record_failure(&self, message: String) -> SyncOutcome {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::error!("Sync failed ({} in a row): {}", failures, message);
        self.set_status(SyncStatus::Error).await;
        SyncOutcome::Failed(message)
    }

    /// One sync round-trip. Concurrent callers get `Skipped`.
    pub async fn sync_now(&self) -> SyncOutcome {
        let _guard = match InFlightGuard::acquire(&self.in_flight) {
            Some(guard) => guard,
            None => {
                tracing::debug!("Sync already in flight, skipping");
                return SyncOutcome::Skipped;
            }
        };

        self.set_status(SyncStatus::Syncing).await;

        let last_sync = match self.store.get(LAST_SYNC_KEY) {
            Ok(value) => value,
            Err(e) => return self.record_failure(format!("Failed to read watermark: {}", e)).await,
        };

        let response = match self.backend.sync(last_sync.as_deref()).await {
            Ok(response) => response,
            Err(e) => return self.record_failure(e.to_string()).await,
        };

        let updates = match (response.success, response.updates) {
            (true, Some(updates)) => updates,
            _ => {
                tracing::debug!("Sync returned no updates");
                self.consecutive_failures.store(0, Ordering::Release);
                self.set_status(SyncStatus::Synced).await;
                return SyncOutcome::NoUpdates;
            }
        };

        let received = self.state.write().await.apply_sync_updates(&updates);

        // Merged rows are de-duplicated, so a failed write here only means
        // the same window is fetched again next time.
        if let Err(e) = self.store.set(LAST_SYNC_KEY, &response.server_time) {
            return self
                .record_failure(format!("Failed to persist watermark: {}", e))
                .await;
        }

        self.consecutive_failures.store(0, Ordering::Release);
        self.set_status(SyncStatus::Synced).await;
        if received > 0 {
            self.refresh.notify_one();
        }

        tracing::info!(
            "Sync completed: {} transactions, watermark {}",
            received,
            response.server_time
        );

        SyncOutcome::Applied {
            received,
            watermark: response.server_time,
        }
    }

    /// Forgets the stored watermark so the next round asks for everything.
    pub fn reset_watermark(&self) -> Result<(), StorageError> {
        self.store.remove(LAST_SYNC_KEY)?;
        tracing::info!("Sync watermark cleared");
        Ok(())
    }

    /// Starts the timer loop: one sync right away, then one per interval,
    /// stretched by the backoff policy while failures repeat.
    pub async fn start(self: &Arc<Self>) {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let manager = Arc::clone(self);
        *task = Some(tokio::spawn(async move {
            loop {
                manager.sync_now().await;
                let delay = manager.next_delay();
                tracing::debug!("Next sync in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }));

        tracing::info!("Sync loop started (interval {:?})", self.policy.base);
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
            tracing::info!("Sync loop stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
