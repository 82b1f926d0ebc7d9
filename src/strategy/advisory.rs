use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::llm::LlmClient;
use crate::metrics::IntensityMetrics;
use crate::models::{AggregatedWindow, BreakRecommendation, BreakUrgency};
use crate::strategy::AnalysisStrategy;

const FALLBACK_CRITICAL_RATE: f64 = 150.0;
const FALLBACK_MODERATE_RATE: f64 = 75.0;

/// Expected shape of the advisory reply. Anything else is a soft error
/// and routes to the fallback heuristic.
#[derive(Debug, Deserialize)]
struct AdvisoryReply {
    #[serde(rename = "needsBreak")]
    needs_break: bool,
    urgency: Option<String>,
    #[serde(rename = "durationMinutes")]
    duration_minutes: Option<i64>,
    reason: Option<String>,
}

/// Delegates break judgement to an external advisory model. The call
/// is bounded by an explicit timeout. A timeout, transport error, or
/// malformed reply never surfaces to the caller; it resolves to an
/// independent deterministic heuristic instead, with the reason text
/// tagged so consumers can tell the two apart.
pub struct AdvisoryStrategy {
    llm: Arc<dyn LlmClient>,
    call_timeout: Duration,
}

impl AdvisoryStrategy {
    pub fn new(llm: Arc<dyn LlmClient>, call_timeout: Duration) -> Self {
        AdvisoryStrategy { llm, call_timeout }
    }

    fn build_prompt(windows: &[AggregatedWindow]) -> String {
        let span = observed_span(windows);
        let metrics = IntensityMetrics::from_windows(windows, span);

        let pattern_lines = windows
            .iter()
            .take(10)
            .map(|w| {
                format!(
                    "- {} to {}: {} events ({} keyboard, {} pointer)",
                    w.window_start.format("%H:%M:%S"),
                    w.window_end.format("%H:%M:%S"),
                    w.total_count,
                    w.keyboard_count,
                    w.pointer_count
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are an ergonomics expert for computer work. Analyze this user \
             activity from the last {:.0} minutes:\n\
             - Total input events: {}\n\
             - Average intensity: {:.1} events/minute\n\n\
             Recent activity windows:\n{}\n\n\
             Assess the ergonomic risk and recommend a break if needed.\n\
             Respond ONLY with JSON in this exact shape:\n\
             {{\"needsBreak\": true/false, \"urgency\": \"LOW/MEDIUM/HIGH/CRITICAL\", \
             \"durationMinutes\": number, \"reason\": \"short justification\"}}",
            metrics.window_minutes, metrics.total_events, metrics.events_per_minute, pattern_lines
        )
    }

    fn parse_reply(
        reply: &str,
        windows: &[AggregatedWindow],
    ) -> Result<Option<BreakRecommendation>> {
        let json = extract_json_object(reply)?;
        let parsed: AdvisoryReply =
            serde_json::from_str(json).context("advisory reply is not the expected JSON shape")?;

        if !parsed.needs_break {
            return Ok(None);
        }

        let urgency = match parsed.urgency.as_deref() {
            Some(s) => BreakUrgency::parse_lenient(s).unwrap_or_else(|| {
                warn!("unknown advisory urgency {s:?}, defaulting to Medium");
                BreakUrgency::Medium
            }),
            None => BreakUrgency::Medium,
        };

        let duration = match parsed.duration_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ => match urgency {
                BreakUrgency::Critical | BreakUrgency::High => 10,
                _ => 5,
            },
        };

        let reason = parsed
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "sustained intensive activity".to_string());

        let metrics = IntensityMetrics::from_windows(windows, observed_span(windows));

        Ok(Some(BreakRecommendation::new(
            urgency,
            format!("Advisory analysis: {reason}"),
            duration,
            metrics,
        )))
    }

    /// Second, independent heuristic used when the advisory collaborator
    /// is unusable. Works off the average per-window rate.
    fn fallback(&self, windows: &[AggregatedWindow]) -> Option<BreakRecommendation> {
        let avg_rate = average_window_rate(windows);
        let metrics = IntensityMetrics::from_windows(windows, observed_span(windows));

        if avg_rate > FALLBACK_CRITICAL_RATE {
            Some(BreakRecommendation::new(
                BreakUrgency::Critical,
                format!("Fallback analysis: sustained high intensity of {avg_rate:.0} events/minute."),
                10,
                metrics,
            ))
        } else if avg_rate > FALLBACK_MODERATE_RATE {
            Some(BreakRecommendation::new(
                BreakUrgency::Medium,
                format!("Fallback analysis: moderate intensity of {avg_rate:.0} events/minute."),
                5,
                metrics,
            ))
        } else {
            None
        }
    }
}

#[async_trait]
impl AnalysisStrategy for AdvisoryStrategy {
    async fn analyze(&self, windows: &[AggregatedWindow]) -> Option<BreakRecommendation> {
        if windows.is_empty() {
            return None;
        }

        let prompt = Self::build_prompt(windows);

        let reply = match tokio::time::timeout(self.call_timeout, self.llm.complete(&prompt)).await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("advisory call failed, using fallback heuristic: {e:#}");
                return self.fallback(windows);
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.call_timeout.as_secs(),
                    "advisory call timed out, using fallback heuristic"
                );
                return self.fallback(windows);
            }
        };

        debug!(reply = %reply, "advisory reply received");

        match Self::parse_reply(&reply, windows) {
            Ok(recommendation) => recommendation,
            Err(e) => {
                warn!("unusable advisory reply, using fallback heuristic: {e:#}");
                self.fallback(windows)
            }
        }
    }

    fn name(&self) -> &str {
        "advisory"
    }
}

/// Pulls the first JSON object out of a reply that may be wrapped in
/// markdown fences or prose.
fn extract_json_object(reply: &str) -> Result<&str> {
    let start = reply.find('{').ok_or_else(|| anyhow!("no JSON object in advisory reply"))?;
    let end = reply.rfind('}').ok_or_else(|| anyhow!("unterminated JSON in advisory reply"))?;
    if end < start {
        return Err(anyhow!("malformed JSON in advisory reply"));
    }
    Ok(&reply[start..=end])
}

fn observed_span(windows: &[AggregatedWindow]) -> chrono::Duration {
    let start = windows.iter().map(|w| w.window_start).min();
    let end = windows.iter().map(|w| w.window_end).max();
    match (start, end) {
        (Some(start), Some(end)) => end - start,
        _ => chrono::Duration::zero(),
    }
}

/// Mean of the per-window event rates.
fn average_window_rate(windows: &[AggregatedWindow]) -> f64 {
    if windows.is_empty() {
        return 0.0;
    }
    let sum: f64 = windows
        .iter()
        .map(|w| {
            IntensityMetrics::from_counts(
                w.total_count.max(0) as u64,
                w.keyboard_count.max(0) as u64,
                w.pointer_count.max(0) as u64,
                w.duration(),
            )
            .events_per_minute
        })
        .sum();
    sum / windows.len() as f64
}
