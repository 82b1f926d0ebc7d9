use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

use crate::models::{BreakRecommendation, NotificationOutcome};

mod desktop;
mod logging;

pub use desktop::DesktopNotifier;
pub use logging::LoggingNotifier;

/// A notification channel. Implementations vary by platform and are
/// swappable without touching the dispatcher.
#[async_trait]
pub trait BreakNotifier: Send + Sync {
    async fn notify(&self, recommendation: &BreakRecommendation) -> Result<()>;

    fn name(&self) -> &str;
}

/// Fans one recommendation out to every registered channel. Channels
/// run in parallel, each bounded by a timeout; a failing or hanging
/// channel never prevents the others from being attempted. No retries:
/// a missed notification is lost for that cycle.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn BreakNotifier>>,
    per_channel_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn BreakNotifier>>, per_channel_timeout: Duration) -> Self {
        NotificationDispatcher {
            channels,
            per_channel_timeout,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub async fn dispatch(&self, recommendation: &BreakRecommendation) -> Vec<NotificationOutcome> {
        let mut handles = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let channel = channel.clone();
            let recommendation = recommendation.clone();
            let limit = self.per_channel_timeout;
            let name = channel.name().to_string();

            let handle = tokio::spawn(async move {
                timeout(limit, channel.notify(&recommendation)).await
            });
            handles.push((name, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(Ok(Ok(()))) => NotificationOutcome {
                    channel: name,
                    succeeded: true,
                    error: None,
                },
                Ok(Ok(Err(e))) => NotificationOutcome {
                    channel: name,
                    succeeded: false,
                    error: Some(format!("{e:#}")),
                },
                Ok(Err(_)) => NotificationOutcome {
                    channel: name,
                    succeeded: false,
                    error: Some(format!(
                        "timed out after {}s",
                        self.per_channel_timeout.as_secs()
                    )),
                },
                Err(e) => NotificationOutcome {
                    channel: name,
                    succeeded: false,
                    error: Some(format!("channel task failed: {e}")),
                },
            };

            if outcome.succeeded {
                info!(channel = %outcome.channel, "notification sent");
            } else {
                error!(
                    channel = %outcome.channel,
                    error = outcome.error.as_deref().unwrap_or("unknown"),
                    "notification failed"
                );
            }
            outcomes.push(outcome);
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::IntensityMetrics;
    use crate::models::BreakUrgency;
    use anyhow::anyhow;
    use chrono::Duration as ChronoDuration;
    use pretty_assertions::assert_eq;

    struct ScriptedNotifier {
        label: String,
        fail: bool,
        delay: Duration,
    }

    impl ScriptedNotifier {
        fn ok(label: &str) -> Arc<Self> {
            Arc::new(ScriptedNotifier {
                label: label.to_string(),
                fail: false,
                delay: Duration::ZERO,
            })
        }

        fn failing(label: &str) -> Arc<Self> {
            Arc::new(ScriptedNotifier {
                label: label.to_string(),
                fail: true,
                delay: Duration::ZERO,
            })
        }

        fn hanging(label: &str, delay: Duration) -> Arc<Self> {
            Arc::new(ScriptedNotifier {
                label: label.to_string(),
                fail: false,
                delay,
            })
        }
    }

    #[async_trait]
    impl BreakNotifier for ScriptedNotifier {
        async fn notify(&self, _recommendation: &BreakRecommendation) -> Result<()> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                Err(anyhow!("platform unavailable"))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            &self.label
        }
    }

    fn recommendation() -> BreakRecommendation {
        BreakRecommendation::new(
            BreakUrgency::Medium,
            "test",
            5,
            IntensityMetrics::from_counts(300, 200, 100, ChronoDuration::minutes(2)),
        )
    }

    #[tokio::test]
    async fn failing_channel_does_not_block_the_others() {
        let dispatcher = NotificationDispatcher::new(
            vec![
                ScriptedNotifier::ok("one"),
                ScriptedNotifier::failing("two"),
                ScriptedNotifier::ok("three"),
            ],
            Duration::from_secs(5),
        );

        let outcomes = dispatcher.dispatch(&recommendation()).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].succeeded);
        assert!(!outcomes[1].succeeded);
        assert!(outcomes[1].error.as_deref().unwrap().contains("platform unavailable"));
        assert!(outcomes[2].succeeded);
    }

    #[tokio::test]
    async fn hanging_channel_is_cut_off_by_the_timeout() {
        let dispatcher = NotificationDispatcher::new(
            vec![
                ScriptedNotifier::hanging("slow", Duration::from_secs(60)),
                ScriptedNotifier::ok("fast"),
            ],
            Duration::from_millis(50),
        );

        let outcomes = dispatcher.dispatch(&recommendation()).await;

        assert!(!outcomes[0].succeeded);
        assert!(outcomes[0].error.as_deref().unwrap().contains("timed out"));
        assert!(outcomes[1].succeeded);
    }

    #[tokio::test]
    async fn empty_dispatcher_completes_with_no_outcomes() {
        let dispatcher = NotificationDispatcher::new(vec![], Duration::from_secs(1));
        assert!(dispatcher.dispatch(&recommendation()).await.is_empty());
    }
}
