pub mod event;
pub mod recommendation;

pub use event::{ActivityKind, AggregatedWindow, RawActivityEvent};
pub use recommendation::{BreakRecommendation, BreakUrgency, NotificationOutcome};
