pub mod api;
pub mod app;
pub mod config;
pub mod jobs;
pub mod modal;
pub mod navigation;
pub mod render;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, FinanceApiClient, FinanceBackend};
pub use app::App;
