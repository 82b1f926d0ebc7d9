use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::AggregatedWindow;
use crate::store::WindowStore;

/// In-memory window store for tests and `--memory-db` runs.
#[derive(Default)]
pub struct MemoryWindowStore {
    windows: Mutex<Vec<AggregatedWindow>>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl WindowStore for MemoryWindowStore {
    async fn save_window(&self, window: &AggregatedWindow) -> Result<i64> {
        let mut windows = self.windows.lock().unwrap();
        let id = windows.len() as i64 + 1;
        let mut stored = window.clone();
        stored.id = Some(id);
        windows.push(stored);
        Ok(id)
    }

    async fn recent_windows(&self, limit: i64) -> Result<Vec<AggregatedWindow>> {
        let windows = self.windows.lock().unwrap();
        let mut recent: Vec<AggregatedWindow> = windows.clone();
        recent.sort_by(|a, b| b.window_end.cmp(&a.window_end));
        recent.truncate(limit.max(0) as usize);
        Ok(recent)
    }
}
