pub mod buffer;
pub mod capture;
pub mod config;
pub mod llm;
pub mod metrics;
pub mod models;
pub mod notify;
pub mod scheduler;
pub mod store;
pub mod strategy;
pub mod throttle;

pub use buffer::{ActivityBuffer, BufferConfig};
pub use config::Config;
pub use metrics::IntensityMetrics;
pub use models::{
    ActivityKind, AggregatedWindow, BreakRecommendation, BreakUrgency, NotificationOutcome,
    RawActivityEvent,
};
pub use scheduler::{AnalysisScheduler, CycleOutcome};
pub use throttle::ThrottleGate;
