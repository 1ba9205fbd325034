pub mod page_loader;
pub mod sync_manager;

pub use page_loader::PageLoader;
pub use sync_manager::{BackoffPolicy, SyncManager, SyncOutcome, SyncStatus};
