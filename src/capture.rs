use rdev::{listen, EventType as RdevEventType};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

use crate::buffer::ActivityBuffer;
use crate::models::{ActivityKind, RawActivityEvent};

/// Starts the OS-level input hook on a dedicated thread and feeds the
/// aggregation buffer. The hook callback only counts events, it never
/// records which keys were pressed, and `ingest` never blocks it.
///
/// The rest of the system depends only on the buffer, not on rdev.
pub fn spawn_capture(buffer: Arc<ActivityBuffer>) {
    thread::spawn(move || {
        info!("starting input capture thread");

        if let Err(err) = listen(move |event| {
            let kind = match event.event_type {
                RdevEventType::KeyPress(_) => Some(ActivityKind::Keyboard),
                RdevEventType::ButtonPress(_) | RdevEventType::Wheel { .. } => {
                    Some(ActivityKind::Pointer)
                }
                _ => None,
            };

            if let Some(kind) = kind {
                buffer.ingest(RawActivityEvent::now(kind));
            }
        }) {
            error!("input capture listener failed: {err:?}");
        }
    });
}
