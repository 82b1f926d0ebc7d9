use chrono::Duration;
use serde::Serialize;

use crate::models::AggregatedWindow;

/// Derived rate metrics for a span of activity. Pure data: computed
/// from counts and a time window, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntensityMetrics {
    pub total_events: u64,
    pub keyboard_events: u64,
    pub pointer_events: u64,
    pub window_minutes: f64,
    pub events_per_minute: f64,
}

impl IntensityMetrics {
    pub fn from_counts(
        total_events: u64,
        keyboard_events: u64,
        pointer_events: u64,
        window: Duration,
    ) -> Self {
        let window_minutes = window.num_milliseconds() as f64 / 60_000.0;
        let events_per_minute = if window_minutes <= 0.0 {
            0.0
        } else {
            total_events as f64 / window_minutes
        };

        IntensityMetrics {
            total_events,
            keyboard_events,
            pointer_events,
            window_minutes,
            events_per_minute,
        }
    }

    /// Sums the counts of several aggregated windows into one metric
    /// over the given nominal time window.
    pub fn from_windows(windows: &[AggregatedWindow], window: Duration) -> Self {
        let total: i64 = windows.iter().map(|w| w.total_count).sum();
        let keyboard: i64 = windows.iter().map(|w| w.keyboard_count).sum();
        let pointer: i64 = windows.iter().map(|w| w.pointer_count).sum();

        Self::from_counts(
            total.max(0) as u64,
            keyboard.max(0) as u64,
            pointer.max(0) as u64,
            window,
        )
    }

    /// High intensity: sustained input above 100 events per minute.
    /// Strict inequality, exactly 100/min is not flagged.
    pub fn is_intensive(&self) -> bool {
        self.events_per_minute > 100.0
    }

    /// Critical intensity: above 200 events per minute. Strict.
    pub fn is_critical(&self) -> bool {
        self.events_per_minute > 200.0
    }
}
