use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::path::Path;
use tracing::info;

use crate::models::AggregatedWindow;
use crate::store::WindowStore;

/// SQLite-backed window store.
#[derive(Clone)]
pub struct SqliteWindowStore {
    pool: Pool<Sqlite>,
}

impl SqliteWindowStore {
    pub async fn new(connection_string: &str) -> Result<Self> {
        // For file-backed databases make sure the parent directory exists,
        // sqlite won't create it on its own.
        if let Some(path) = connection_string.strip_prefix("sqlite:") {
            if path != ":memory:" && !path.is_empty() {
                let db_path = Path::new(path);
                if let Some(parent) = db_path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                if !db_path.exists() {
                    std::fs::File::create(db_path)?;
                }
            }
        }

        info!("connecting to window database: {connection_string}");
        let pool = SqlitePool::connect(connection_string).await?;

        let store = Self { pool };
        store.ensure_schema().await?;

        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS aggregated_windows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                total_count INTEGER NOT NULL,
                keyboard_count INTEGER NOT NULL,
                pointer_count INTEGER NOT NULL,
                window_start TIMESTAMP NOT NULL,
                window_end TIMESTAMP NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_windows_end
            ON aggregated_windows(window_end);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl WindowStore for SqliteWindowStore {
    async fn save_window(&self, window: &AggregatedWindow) -> Result<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO aggregated_windows
                (total_count, keyboard_count, pointer_count, window_start, window_end)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(window.total_count)
        .bind(window.keyboard_count)
        .bind(window.pointer_count)
        .bind(window.window_start)
        .bind(window.window_end)
        .fetch_one(&self.pool)
        .await?
        .get::<i64, _>("id");

        Ok(id)
    }

    async fn recent_windows(&self, limit: i64) -> Result<Vec<AggregatedWindow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, total_count, keyboard_count, pointer_count, window_start, window_end
            FROM aggregated_windows
            ORDER BY window_end DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut windows = Vec::with_capacity(rows.len());
        for row in rows {
            let window_start: DateTime<Utc> = row.get("window_start");
            let window_end: DateTime<Utc> = row.get("window_end");
            windows.push(AggregatedWindow {
                id: Some(row.get("id")),
                total_count: row.get("total_count"),
                keyboard_count: row.get("keyboard_count"),
                pointer_count: row.get("pointer_count"),
                window_start,
                window_end,
            });
        }

        Ok(windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn round_trips_windows_newest_first() {
        let store = SqliteWindowStore::new("sqlite::memory:").await.unwrap();
        let start = Utc::now();

        for i in 0..3 {
            let window = AggregatedWindow::new(
                10 + i,
                5,
                start + Duration::seconds(i * 10),
                start + Duration::seconds(i * 10 + 10),
            );
            store.save_window(&window).await.unwrap();
        }

        let recent = store.recent_windows(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].keyboard_count, 12);
        assert_eq!(recent[1].keyboard_count, 11);
        assert!(recent[0].window_end > recent[1].window_end);
        assert!(recent[0].id.is_some());
    }
}
