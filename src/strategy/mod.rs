use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::llm::LlmClient;
use crate::models::{AggregatedWindow, BreakRecommendation};

mod advisory;
mod pomodoro;

pub use advisory::AdvisoryStrategy;
pub use pomodoro::PomodoroStrategy;

/// A pluggable decision algorithm mapping recent activity to at most
/// one break recommendation. Strategies resolve their own failures and
/// never return an error: `None` always means "no break warranted".
#[async_trait]
pub trait AnalysisStrategy: Send + Sync {
    async fn analyze(&self, windows: &[AggregatedWindow]) -> Option<BreakRecommendation>;

    fn name(&self) -> &str;
}

/// Ordered strategy list with first-match-wins semantics: strategies
/// run sequentially and the chain stops at the first one producing a
/// recommendation; later strategies are not invoked that cycle. The
/// order is a configuration decision, the stop condition is not.
pub struct StrategyChain {
    strategies: Vec<Arc<dyn AnalysisStrategy>>,
}

impl std::fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyChain")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl StrategyChain {
    pub fn new(strategies: Vec<Arc<dyn AnalysisStrategy>>) -> Self {
        StrategyChain { strategies }
    }

    /// Builds the chain from configured strategy names, preserving
    /// their order. Unknown names are rejected at startup rather than
    /// silently skipped.
    pub fn from_names(
        names: &[String],
        llm: Arc<dyn LlmClient>,
        advisory_timeout: Duration,
    ) -> Result<Self> {
        let mut strategies: Vec<Arc<dyn AnalysisStrategy>> = Vec::with_capacity(names.len());
        for name in names {
            match name.as_str() {
                "pomodoro" => strategies.push(Arc::new(PomodoroStrategy)),
                "advisory" => strategies.push(Arc::new(AdvisoryStrategy::new(
                    llm.clone(),
                    advisory_timeout,
                ))),
                other => bail!("unknown analysis strategy: {other}"),
            }
        }
        Ok(StrategyChain::new(strategies))
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub async fn evaluate(&self, windows: &[AggregatedWindow]) -> Option<BreakRecommendation> {
        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "applying strategy");
            if let Some(recommendation) = strategy.analyze(windows).await {
                info!(
                    strategy = strategy.name(),
                    urgency = ?recommendation.urgency,
                    "strategy produced a recommendation"
                );
                return Some(recommendation);
            }
        }
        None
    }
}
