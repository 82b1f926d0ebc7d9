use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::models::BreakRecommendation;
use crate::notify::BreakNotifier;

/// Log-only channel. Always available; doubles as the audit trail for
/// every dispatched recommendation.
pub struct LoggingNotifier;

#[async_trait]
impl BreakNotifier for LoggingNotifier {
    async fn notify(&self, recommendation: &BreakRecommendation) -> Result<()> {
        warn!(
            urgency = ?recommendation.urgency,
            suggested_minutes = recommendation.suggested_break_minutes,
            events_per_minute = recommendation.metrics.events_per_minute,
            reason = %recommendation.reason,
            "break recommended"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::IntensityMetrics;
    use crate::models::BreakUrgency;
    use chrono::Duration;

    #[tokio::test]
    async fn logging_channel_never_fails() {
        let rec = BreakRecommendation::new(
            BreakUrgency::Critical,
            "sustained typing",
            10,
            IntensityMetrics::from_counts(5200, 4000, 1200, Duration::minutes(25)),
        );
        assert!(LoggingNotifier.notify(&rec).await.is_ok());
    }
}
