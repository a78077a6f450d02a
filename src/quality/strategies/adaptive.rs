use serde::{Deserialize, Serialize};

use crate::pipeline::{FilterConfig, StrategyKind};
use crate::quality::{Metric, QualityVector};
use crate::report::stats::metric_values;

use super::{strategy_for, FilterStrategy, StrategyEvaluation};

/// Why the adaptive strategy picked a concrete strategy for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AdaptiveDecision {
    /// Scores are spread widely: group images by profile.
    DiversityHigh { diversity: f64 },
    /// The representative metric varies strongly: rank within the batch.
    QualityVarianceHigh { metric: Metric, variance: f64 },
    /// Neither signal is strong: apply fixed bounds.
    Default,
}

impl AdaptiveDecision {
    /// Picks a decision from precomputed batch signals.
    pub fn decide(
        diversity: f64,
        variance: Option<(Metric, f64)>,
        config: &FilterConfig,
    ) -> Self {
        if diversity > config.adaptive_diversity_threshold {
            return AdaptiveDecision::DiversityHigh { diversity };
        }
        match variance {
            Some((metric, variance)) if variance > config.adaptive_variance_threshold => {
                AdaptiveDecision::QualityVarianceHigh { metric, variance }
            }
            _ => AdaptiveDecision::Default,
        }
    }

    /// Measures the batch and picks a decision.
    pub fn for_batch(vectors: &[QualityVector], config: &FilterConfig) -> Self {
        Self::decide(
            batch_diversity(vectors, &config.enabled_metrics),
            representative_variance(vectors, &config.enabled_metrics),
            config,
        )
    }

    pub fn strategy(&self) -> StrategyKind {
        match self {
            AdaptiveDecision::DiversityHigh { .. } => StrategyKind::Clustering,
            AdaptiveDecision::QualityVarianceHigh { .. } => StrategyKind::Percentile,
            AdaptiveDecision::Default => StrategyKind::Threshold,
        }
    }
}

/// Population standard deviation of every enabled score in the batch.
pub fn batch_diversity(vectors: &[QualityVector], enabled: &[Metric]) -> f64 {
    let values: Vec<f64> = vectors
        .iter()
        .flat_map(|v| v.iter())
        .filter(|(m, _)| enabled.contains(m))
        .map(|(_, s)| s)
        .collect();
    population_variance(&values).sqrt()
}

/// Variance of the first enabled metric present in the batch.
pub fn representative_variance(vectors: &[QualityVector], enabled: &[Metric]) -> Option<(Metric, f64)> {
    enabled.iter().find_map(|&metric| {
        let values = metric_values(vectors, metric);
        (!values.is_empty()).then(|| (metric, population_variance(&values)))
    })
}

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Chooses clustering, percentile, or threshold filtering from batch statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveStrategy;

impl FilterStrategy for AdaptiveStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Adaptive
    }

    fn evaluate(&self, vectors: &[QualityVector], config: &FilterConfig) -> StrategyEvaluation {
        let decision = AdaptiveDecision::for_batch(vectors, config);
        let resolved = decision.strategy();
        tracing::info!(?decision, strategy = %resolved, "Adaptive filtering resolved strategy");

        let mut evaluation = strategy_for(resolved).evaluate(vectors, config);
        evaluation.resolved = Some(resolved);
        evaluation
    }
}
