use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{debug, error, warn};

use crate::models::{ActivityKind, AggregatedWindow, RawActivityEvent};
use crate::store::WindowStore;

/// Flush policy and queue bounds for the aggregation buffer.
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Close the window once this many events accumulated.
    pub max_events: i64,
    /// Close the window once this much time passed since its first event.
    pub max_age: Duration,
    /// Completed windows waiting for persistence. Oldest are dropped
    /// on overflow so ingest never stalls behind a slow store.
    pub queue_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig {
            max_events: 50,
            max_age: Duration::seconds(10),
            queue_capacity: 64,
        }
    }
}

#[derive(Debug, Default)]
struct WindowInProgress {
    keyboard_count: i64,
    pointer_count: i64,
    started_at: Option<DateTime<Utc>>,
}

impl WindowInProgress {
    fn total(&self) -> i64 {
        self.keyboard_count + self.pointer_count
    }

    fn take_as_window(&mut self, window_end: DateTime<Utc>) -> Option<AggregatedWindow> {
        let started_at = self.started_at.take()?;
        let window = AggregatedWindow::new(
            self.keyboard_count,
            self.pointer_count,
            started_at,
            window_end,
        );
        self.keyboard_count = 0;
        self.pointer_count = 0;
        Some(window)
    }
}

/// Accumulates raw input events into count-bounded, time-bounded
/// windows. `ingest` is safe under concurrent producers and never
/// blocks on persistence: completed windows go into a bounded queue
/// that a separate worker drains into the store.
pub struct ActivityBuffer {
    config: BufferConfig,
    current: Mutex<WindowInProgress>,
    flushed: Mutex<VecDeque<AggregatedWindow>>,
    dropped_windows: AtomicU64,
}

impl ActivityBuffer {
    pub fn new(config: BufferConfig) -> Self {
        let capacity = config.queue_capacity;
        ActivityBuffer {
            config,
            current: Mutex::new(WindowInProgress::default()),
            flushed: Mutex::new(VecDeque::with_capacity(capacity)),
            dropped_windows: AtomicU64::new(0),
        }
    }

    /// Records one raw event. Closes and queues the current window
    /// inline when the event-count threshold is hit, under the same
    /// lock, so no event is lost or attributed to two windows.
    pub fn ingest(&self, event: RawActivityEvent) {
        let mut current = self.current.lock().unwrap();

        if current.started_at.is_none() {
            current.started_at = Some(event.observed_at);
        }
        match event.kind {
            ActivityKind::Keyboard => current.keyboard_count += 1,
            ActivityKind::Pointer => current.pointer_count += 1,
        }

        if current.total() >= self.config.max_events {
            if let Some(window) = current.take_as_window(event.observed_at) {
                // Enqueued before the window lock is released, so windows
                // enter the queue in the order they closed. The queue push
                // is cheap and never touches the store.
                self.enqueue(window);
            }
        }
    }

    /// Closes the current window if it has aged past the time
    /// threshold. Called by the flush ticker.
    pub fn flush_if_stale(&self, now: DateTime<Utc>) {
        let mut current = self.current.lock().unwrap();
        match current.started_at {
            Some(started) if now - started >= self.config.max_age => {
                if let Some(window) = current.take_as_window(now) {
                    self.enqueue(window);
                }
            }
            _ => {}
        }
    }

    /// Pops the oldest completed window, if any. Windows come out in
    /// the order they closed.
    pub fn poll_flushed(&self) -> Option<AggregatedWindow> {
        self.flushed.lock().unwrap().pop_front()
    }

    /// Number of completed windows discarded due to queue overflow.
    pub fn dropped_windows(&self) -> u64 {
        self.dropped_windows.load(Ordering::Relaxed)
    }

    fn enqueue(&self, window: AggregatedWindow) {
        debug!(
            total = window.total_count,
            keyboard = window.keyboard_count,
            pointer = window.pointer_count,
            "window closed"
        );

        let mut queue = self.flushed.lock().unwrap();
        queue.push_back(window);
        if queue.len() > self.config.queue_capacity {
            queue.pop_front();
            let dropped = self.dropped_windows.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(dropped, "flush queue full, dropped oldest window");
        }
    }
}

/// Ticks once a second and closes windows that hit the age threshold.
pub fn spawn_flush_ticker(buffer: Arc<ActivityBuffer>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(TokioDuration::from_secs(1));
        loop {
            ticker.tick().await;
            buffer.flush_if_stale(Utc::now());
        }
    })
}

/// Drains completed windows into the store. A failed save is logged and
/// the window is lost; the worker keeps going either way.
pub fn spawn_persist_worker(
    buffer: Arc<ActivityBuffer>,
    store: Arc<dyn WindowStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(TokioDuration::from_millis(500));
        loop {
            ticker.tick().await;
            while let Some(window) = buffer.poll_flushed() {
                match store.save_window(&window).await {
                    Ok(id) => debug!(id, total = window.total_count, "window persisted"),
                    Err(e) => error!("failed to persist window: {e:#}"),
                }
            }
        }
    })
}
