use std::future::Future;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::navigation::Page;

/// Runs at most one page load at a time. Starting a new load aborts the one
/// still running for the previous navigation.
#[derive(Default)]
pub struct PageLoader {
    current: Mutex<Option<(Page, JoinHandle<()>)>>,
}

impl PageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load<F>(&self, page: Page, load: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut current = self.current.lock().await;
        if let Some((previous, handle)) = current.take() {
            if !handle.is_finished() {
                tracing::debug!("Cancelling load of {} superseded by {}", previous, page);
                handle.abort();
            }
        }

        tracing::debug!("Loading page {}", page);
        *current = Some((page, tokio::spawn(load)));
    }

    /// Waits for the latest load. Returns the page if it ran to completion.
    pub async fn wait_current(&self) -> Option<Page> {
        let current = self.current.lock().await.take();
        let (page, handle) = current?;

        match handle.await {
            Ok(()) => Some(page),
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                tracing::error!("Page load for {} panicked: {}", page, e);
                None
            }
        }
    }

    pub async fn cancel(&self) {
        if let Some((page, handle)) = self.current.lock().await.take() {
            tracing::debug!("Cancelling load of {}", page);
            handle.abort();
        }
    }
}
