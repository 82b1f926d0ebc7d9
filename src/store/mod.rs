use anyhow::Result;
use async_trait::async_trait;

use crate::models::AggregatedWindow;

mod memory;
mod sqlite;

pub use memory::MemoryWindowStore;
pub use sqlite::SqliteWindowStore;

/// Persistence boundary for completed aggregation windows.
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Saves one window and returns its row id.
    async fn save_window(&self, window: &AggregatedWindow) -> Result<i64>;

    /// Returns up to `limit` windows, newest first.
    async fn recent_windows(&self, limit: i64) -> Result<Vec<AggregatedWindow>>;
}
