use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

/// Sentinel for "never notified".
const NEVER: i64 = i64::MIN;

/// Minimum-interval guard between dispatched notifications.
///
/// The only shared mutable state in the engine: the timestamp of the
/// last admitted dispatch, stored as epoch milliseconds behind a CAS so
/// overlapping analysis cycles admit exactly one of themselves. A
/// denied cycle is a deliberate no-op, not an error.
pub struct ThrottleGate {
    min_interval: Duration,
    last_notified_millis: AtomicI64,
}

impl ThrottleGate {
    pub fn new(min_interval: Duration) -> Self {
        ThrottleGate {
            min_interval,
            last_notified_millis: AtomicI64::new(NEVER),
        }
    }

    /// Claims the dispatch slot for `now`. Returns `true` for exactly
    /// one caller when enough time has passed (or no notification was
    /// ever sent). The timestamp updates once, unconditionally, when a
    /// cycle is admitted; per-channel delivery results don't touch it.
    pub fn try_acquire_at(&self, now: DateTime<Utc>) -> bool {
        let now_millis = now.timestamp_millis();
        let mut last = self.last_notified_millis.load(Ordering::Acquire);

        loop {
            let eligible =
                last == NEVER || now_millis - last >= self.min_interval.num_milliseconds();
            if !eligible {
                debug!(
                    since_last_ms = now_millis - last,
                    "notification throttled"
                );
                return false;
            }

            match self.last_notified_millis.compare_exchange(
                last,
                now_millis,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                // Another cycle won the slot; re-check against its timestamp.
                Err(actual) => last = actual,
            }
        }
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Utc::now())
    }

    pub fn last_notified_at(&self) -> Option<DateTime<Utc>> {
        let millis = self.last_notified_millis.load(Ordering::Acquire);
        if millis == NEVER {
            None
        } else {
            DateTime::from_timestamp_millis(millis)
        }
    }

    #[cfg(test)]
    pub(crate) fn reset(&self) {
        self.last_notified_millis.store(NEVER, Ordering::Release);
    }
}
