use async_trait::async_trait;
use chrono::Duration;
use tracing::debug;

use crate::metrics::IntensityMetrics;
use crate::models::{AggregatedWindow, BreakRecommendation, BreakUrgency};
use crate::strategy::AnalysisStrategy;

const POMODORO_MINUTES: i64 = 25;
const SHORT_BREAK_MINUTES: i64 = 5;
const LONG_BREAK_MINUTES: i64 = 10;

/// Pomodoro-inspired heuristic: sums event counts over a nominal
/// 25-minute work span and recommends a break when intensity crosses
/// the ergonomic thresholds. Deterministic, infallible, fast.
pub struct PomodoroStrategy;

#[async_trait]
impl AnalysisStrategy for PomodoroStrategy {
    async fn analyze(&self, windows: &[AggregatedWindow]) -> Option<BreakRecommendation> {
        if windows.is_empty() {
            return None;
        }

        let metrics =
            IntensityMetrics::from_windows(windows, Duration::minutes(POMODORO_MINUTES));
        debug!(events_per_minute = metrics.events_per_minute, "pomodoro analysis");

        if metrics.is_critical() {
            Some(BreakRecommendation::new(
                BreakUrgency::Critical,
                format!(
                    "Very intensive work detected: {:.0} events/minute over {} minutes. \
                     Take a break immediately to prevent repetitive strain.",
                    metrics.events_per_minute, POMODORO_MINUTES
                ),
                LONG_BREAK_MINUTES,
                metrics,
            ))
        } else if metrics.is_intensive() {
            Some(BreakRecommendation::new(
                BreakUrgency::Medium,
                format!(
                    "Intensive work detected: {:.0} events/minute. \
                     A {}-minute pomodoro break is recommended.",
                    metrics.events_per_minute, SHORT_BREAK_MINUTES
                ),
                SHORT_BREAK_MINUTES,
                metrics,
            ))
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "pomodoro"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn windows_totaling(keyboard: i64, pointer: i64) -> Vec<AggregatedWindow> {
        let now = Utc::now();
        vec![AggregatedWindow::new(
            keyboard,
            pointer,
            now - Duration::minutes(25),
            now,
        )]
    }

    #[tokio::test]
    async fn moderate_intensity_suggests_short_break() {
        // 2600 events over 25 minutes = 104/min.
        let rec = PomodoroStrategy
            .analyze(&windows_totaling(2000, 600))
            .await
            .expect("recommendation");

        assert_eq!(rec.urgency, BreakUrgency::Medium);
        assert_eq!(rec.suggested_break_minutes, 5);
        assert_eq!(rec.metrics.events_per_minute, 104.0);
    }

    #[tokio::test]
    async fn critical_intensity_suggests_long_break() {
        // 5200 events over 25 minutes = 208/min.
        let rec = PomodoroStrategy
            .analyze(&windows_totaling(4000, 1200))
            .await
            .expect("recommendation");

        assert_eq!(rec.urgency, BreakUrgency::Critical);
        assert_eq!(rec.suggested_break_minutes, 10);
        assert_eq!(rec.metrics.events_per_minute, 208.0);
    }

    #[tokio::test]
    async fn calm_activity_yields_nothing() {
        // 2500 events over 25 minutes = exactly 100/min, strict boundary.
        assert!(PomodoroStrategy
            .analyze(&windows_totaling(2000, 500))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn no_windows_yields_nothing() {
        assert!(PomodoroStrategy.analyze(&[]).await.is_none());
    }
}
