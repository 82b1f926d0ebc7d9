use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::IntensityMetrics;

/// Ordinal severity of a break recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BreakUrgency {
    Low,
    Medium,
    High,
    Critical,
}

impl BreakUrgency {
    /// Lenient parse used for advisory replies. Case and surrounding
    /// whitespace are ignored; an unknown string yields `None` and the
    /// caller picks its own default.
    pub fn parse_lenient(s: &str) -> Option<BreakUrgency> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(BreakUrgency::Low),
            "medium" | "moderate" => Some(BreakUrgency::Medium),
            "high" => Some(BreakUrgency::High),
            "critical" => Some(BreakUrgency::Critical),
            _ => None,
        }
    }
}

/// Immutable outcome of an analysis strategy: the user should take a
/// break. Built by a strategy, consumed by the dispatcher.
#[derive(Debug, Clone, Serialize)]
pub struct BreakRecommendation {
    pub timestamp: DateTime<Utc>,
    pub urgency: BreakUrgency,
    pub reason: String,
    pub suggested_break_minutes: i64,
    pub metrics: IntensityMetrics,
}

impl BreakRecommendation {
    pub fn new(
        urgency: BreakUrgency,
        reason: impl Into<String>,
        suggested_break_minutes: i64,
        metrics: IntensityMetrics,
    ) -> Self {
        BreakRecommendation {
            timestamp: Utc::now(),
            urgency,
            reason: reason.into(),
            suggested_break_minutes,
            metrics,
        }
    }
}

/// Result of attempting one notification channel during a dispatch.
/// Used for logging only, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationOutcome {
    pub channel: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_is_ordered() {
        assert!(BreakUrgency::Low < BreakUrgency::Medium);
        assert!(BreakUrgency::Medium < BreakUrgency::High);
        assert!(BreakUrgency::High < BreakUrgency::Critical);
    }

    #[test]
    fn lenient_parse_accepts_mixed_case() {
        assert_eq!(
            BreakUrgency::parse_lenient("CRITICAL"),
            Some(BreakUrgency::Critical)
        );
        assert_eq!(
            BreakUrgency::parse_lenient(" medium "),
            Some(BreakUrgency::Medium)
        );
        assert_eq!(BreakUrgency::parse_lenient("panic"), None);
    }
}
