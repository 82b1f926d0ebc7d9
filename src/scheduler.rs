use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::models::BreakRecommendation;
use crate::notify::NotificationDispatcher;
use crate::store::WindowStore;
use crate::strategy::StrategyChain;
use crate::throttle::ThrottleGate;

/// How one analysis cycle ended. Throttled is a deliberate no-op,
/// distinct from "no recommendation".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    FetchFailed,
    NoData,
    NoRecommendation,
    Throttled,
    Dispatched { channels: usize, succeeded: usize },
}

/// Periodic orchestrator: fetch recent windows, run the strategy
/// chain, consult the throttle gate, fan out to channels. Cycles are
/// single-flight: a tick arriving while a cycle is still running is
/// skipped with a log line rather than overlapped.
pub struct AnalysisScheduler {
    store: Arc<dyn WindowStore>,
    chain: StrategyChain,
    gate: ThrottleGate,
    dispatcher: NotificationDispatcher,
    tick_interval: Duration,
    window_limit: i64,
    cycle_guard: Mutex<()>,
    skipped_ticks: AtomicU64,
    dispatched_tx: broadcast::Sender<BreakRecommendation>,
}

impl AnalysisScheduler {
    pub fn new(
        store: Arc<dyn WindowStore>,
        chain: StrategyChain,
        gate: ThrottleGate,
        dispatcher: NotificationDispatcher,
        tick_interval: Duration,
        window_limit: i64,
    ) -> Self {
        let (dispatched_tx, _) = broadcast::channel(16);
        AnalysisScheduler {
            store,
            chain,
            gate,
            dispatcher,
            tick_interval,
            window_limit,
            cycle_guard: Mutex::new(()),
            skipped_ticks: AtomicU64::new(0),
            dispatched_tx,
        }
    }

    /// Hook for downstream layers (push, telemetry) to observe every
    /// dispatched recommendation. A lagging or absent subscriber never
    /// affects the cycle.
    pub fn subscribe(&self) -> broadcast::Receiver<BreakRecommendation> {
        self.dispatched_tx.subscribe()
    }

    /// Runs the periodic loop forever. Each cycle runs on its own task,
    /// so a slow advisory call never delays the next tick; a tick that
    /// lands while a cycle is still in flight is skipped. Every failure
    /// inside a cycle is recovered locally; nothing here ever tears the
    /// loop down.
    pub async fn run(self: Arc<Self>) {
        info!(
            interval_secs = self.tick_interval.as_secs(),
            strategies = self.chain.len(),
            channels = self.dispatcher.channel_count(),
            "analysis scheduler started"
        );

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;

            let scheduler = self.clone();
            tokio::spawn(async move {
                match scheduler.cycle_guard.try_lock() {
                    Ok(_guard) => {
                        let outcome = scheduler.run_cycle().await;
                        debug!(?outcome, "analysis cycle finished");
                    }
                    Err(_) => {
                        scheduler.skipped_ticks.fetch_add(1, Ordering::Relaxed);
                        warn!("previous analysis cycle still running, skipping this tick");
                    }
                }
            });
        }
    }

    /// Manual, synchronous kick of one cycle. Bypasses the timer but
    /// still respects single-flight and the throttle gate.
    pub async fn trigger_now(&self) -> CycleOutcome {
        let _guard = self.cycle_guard.lock().await;
        self.run_cycle().await
    }

    /// Number of scheduled ticks skipped because a cycle was in flight.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks.load(Ordering::Relaxed)
    }

    async fn run_cycle(&self) -> CycleOutcome {
        let windows = match self.store.recent_windows(self.window_limit).await {
            Ok(windows) => windows,
            Err(e) => {
                error!("failed to fetch recent windows: {e:#}");
                return CycleOutcome::FetchFailed;
            }
        };

        if windows.is_empty() {
            debug!("no aggregated windows to analyze");
            return CycleOutcome::NoData;
        }

        let recommendation = match self.chain.evaluate(&windows).await {
            Some(recommendation) => recommendation,
            None => {
                debug!(windows = windows.len(), "no break recommendation this cycle");
                return CycleOutcome::NoRecommendation;
            }
        };

        if !self.gate.try_acquire() {
            info!(
                urgency = ?recommendation.urgency,
                "recommendation suppressed by notification throttle"
            );
            return CycleOutcome::Throttled;
        }

        let outcomes = self.dispatcher.dispatch(&recommendation).await;
        let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
        info!(
            channels = outcomes.len(),
            succeeded,
            urgency = ?recommendation.urgency,
            "break notification dispatched"
        );

        // Hook delivery is best-effort.
        let _ = self.dispatched_tx.send(recommendation);

        CycleOutcome::Dispatched {
            channels: outcomes.len(),
            succeeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregatedWindow, BreakUrgency};
    use crate::notify::BreakNotifier;
    use crate::store::MemoryWindowStore;
    use crate::strategy::PomodoroStrategy;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingNotifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BreakNotifier for CountingNotifier {
        async fn notify(&self, _recommendation: &crate::models::BreakRecommendation) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    async fn seeded_store(total_events: i64) -> Arc<MemoryWindowStore> {
        let store = Arc::new(MemoryWindowStore::new());
        let now = Utc::now();
        let window = AggregatedWindow::new(
            total_events,
            0,
            now - ChronoDuration::minutes(25),
            now,
        );
        crate::store::WindowStore::save_window(store.as_ref(), &window)
            .await
            .unwrap();
        store
    }

    fn scheduler_with(
        store: Arc<MemoryWindowStore>,
        notifier: Arc<CountingNotifier>,
        throttle: ChronoDuration,
    ) -> AnalysisScheduler {
        let chain = StrategyChain::new(vec![Arc::new(PomodoroStrategy)]);
        let dispatcher = NotificationDispatcher::new(vec![notifier], Duration::from_secs(1));
        AnalysisScheduler::new(
            store,
            chain,
            ThrottleGate::new(throttle),
            dispatcher,
            Duration::from_secs(60),
            50,
        )
    }

    #[tokio::test]
    async fn empty_store_ends_the_cycle_early() {
        let store = Arc::new(MemoryWindowStore::new());
        let notifier = Arc::new(CountingNotifier {
            calls: AtomicUsize::new(0),
        });
        let scheduler = scheduler_with(store, notifier.clone(), ChronoDuration::minutes(10));

        assert_eq!(scheduler.trigger_now().await, CycleOutcome::NoData);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn calm_activity_produces_no_recommendation() {
        // 500 events over 25 minutes, far below the intensity bar.
        let store = seeded_store(500).await;
        let notifier = Arc::new(CountingNotifier {
            calls: AtomicUsize::new(0),
        });
        let scheduler = scheduler_with(store, notifier.clone(), ChronoDuration::minutes(10));

        assert_eq!(scheduler.trigger_now().await, CycleOutcome::NoRecommendation);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn intensive_activity_dispatches_once_then_throttles() {
        let store = seeded_store(5200).await;
        let notifier = Arc::new(CountingNotifier {
            calls: AtomicUsize::new(0),
        });
        let scheduler = scheduler_with(store, notifier.clone(), ChronoDuration::minutes(10));

        assert_eq!(
            scheduler.trigger_now().await,
            CycleOutcome::Dispatched {
                channels: 1,
                succeeded: 1
            }
        );
        // Second manual kick inside the throttle interval is suppressed.
        assert_eq!(scheduler.trigger_now().await, CycleOutcome::Throttled);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_throttle_allows_back_to_back_dispatches() {
        let store = seeded_store(5200).await;
        let notifier = Arc::new(CountingNotifier {
            calls: AtomicUsize::new(0),
        });
        let scheduler = scheduler_with(store, notifier.clone(), ChronoDuration::zero());

        scheduler.trigger_now().await;
        scheduler.trigger_now().await;
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 2);
    }

    struct SlowStrategy {
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl crate::strategy::AnalysisStrategy for SlowStrategy {
        async fn analyze(&self, _windows: &[AggregatedWindow]) -> Option<BreakRecommendation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            None
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn slow_cycle_never_blocks_the_timer() {
        let store = seeded_store(500).await;
        let strategy = Arc::new(SlowStrategy {
            delay: Duration::from_millis(400),
            calls: AtomicUsize::new(0),
        });
        let chain = StrategyChain::new(vec![strategy.clone()]);
        let dispatcher = NotificationDispatcher::new(vec![], Duration::from_secs(1));
        let scheduler = Arc::new(AnalysisScheduler::new(
            store,
            chain,
            ThrottleGate::new(ChronoDuration::minutes(10)),
            dispatcher,
            Duration::from_millis(50),
            50,
        ));

        let loop_handle = tokio::spawn(scheduler.clone().run());
        tokio::time::sleep(Duration::from_millis(230)).await;
        loop_handle.abort();

        // One cycle started and held the guard; the ticks landing while
        // it slept were skipped rather than queued behind it.
        assert_eq!(strategy.calls.load(Ordering::SeqCst), 1);
        assert!(scheduler.skipped_ticks() >= 2);
    }

    #[tokio::test]
    async fn dispatched_recommendations_reach_subscribers() {
        let store = seeded_store(5200).await;
        let notifier = Arc::new(CountingNotifier {
            calls: AtomicUsize::new(0),
        });
        let scheduler = scheduler_with(store, notifier, ChronoDuration::minutes(10));
        let mut hook = scheduler.subscribe();

        scheduler.trigger_now().await;

        let recommendation = hook.try_recv().expect("hook delivery");
        assert_eq!(recommendation.urgency, BreakUrgency::Critical);
    }
}
