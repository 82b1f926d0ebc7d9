use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of raw input activity observed by the capture hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Keyboard,
    Pointer,
}

/// A single captured input event. Ephemeral: it only travels from the
/// capture thread into the aggregation buffer and is never persisted.
#[derive(Debug, Clone, Copy)]
pub struct RawActivityEvent {
    pub kind: ActivityKind,
    pub observed_at: DateTime<Utc>,
}

impl RawActivityEvent {
    pub fn now(kind: ActivityKind) -> Self {
        RawActivityEvent {
            kind,
            observed_at: Utc::now(),
        }
    }
}

/// One closed aggregation window. Immutable once built; `total_count`
/// always equals `keyboard_count + pointer_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedWindow {
    pub id: Option<i64>,
    pub total_count: i64,
    pub keyboard_count: i64,
    pub pointer_count: i64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl AggregatedWindow {
    pub fn new(
        keyboard_count: i64,
        pointer_count: i64,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Self {
        AggregatedWindow {
            id: None,
            total_count: keyboard_count + pointer_count,
            keyboard_count,
            pointer_count,
            window_start,
            window_end,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.window_end - self.window_start
    }
}
