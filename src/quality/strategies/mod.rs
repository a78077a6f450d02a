//! Filtering strategies over an assessed batch.
//!
//! Every strategy sees the same input: one [`QualityVector`] per image,
//! already restricted to the enabled metrics, with images that have no
//! assessable metrics removed. Each returns one [`Verdict`] per input in
//! input order. Batch bookkeeping and reporting live in
//! [`super::filter`].

mod adaptive;
mod clustering;
mod ensemble;
mod percentile;
mod threshold;

use std::collections::BTreeMap;

use crate::pipeline::{FilterConfig, StrategyKind};
use crate::report::Quartiles;

use super::{Metric, QualityVector};

pub use adaptive::{AdaptiveDecision, AdaptiveStrategy};
pub use clustering::{ClusteringStrategy, KMeans, KMeansFit};
pub use ensemble::EnsembleStrategy;
pub use percentile::{bucket_score, PercentileStrategy, PERCENTILE_RETENTION_SCORE};
pub use threshold::ThresholdStrategy;

/// Keep-or-reject decision for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub retained: bool,
    /// Empty when retained.
    pub reasons: Vec<String>,
}

impl Verdict {
    pub fn keep() -> Self {
        Self {
            retained: true,
            reasons: Vec::new(),
        }
    }

    pub fn reject(reasons: Vec<String>) -> Self {
        Self {
            retained: false,
            reasons,
        }
    }
}

/// Result of running one strategy over a batch.
#[derive(Debug, Clone, Default)]
pub struct StrategyEvaluation {
    /// One verdict per input vector, in input order.
    pub verdicts: Vec<Verdict>,
    /// Batch quartiles, when the strategy computed them.
    pub percentiles: BTreeMap<Metric, Quartiles>,
    /// The concrete strategy that produced the verdicts, for delegating strategies.
    pub resolved: Option<StrategyKind>,
}

impl StrategyEvaluation {
    pub fn from_verdicts(verdicts: Vec<Verdict>) -> Self {
        Self {
            verdicts,
            ..Default::default()
        }
    }

    pub fn retained_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.retained).count()
    }

    /// Indices of retained inputs, ascending.
    pub fn retained_indices(&self) -> Vec<usize> {
        self.verdicts
            .iter()
            .enumerate()
            .filter(|(_, v)| v.retained)
            .map(|(i, _)| i)
            .collect()
    }
}

/// A policy that decides which images of an assessed batch are kept.
pub trait FilterStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Returns one verdict per vector. `vectors` is non-empty and every
    /// vector holds at least one enabled metric.
    fn evaluate(&self, vectors: &[QualityVector], config: &FilterConfig) -> StrategyEvaluation;
}

/// Builds the strategy for `kind`.
pub fn strategy_for(kind: StrategyKind) -> Box<dyn FilterStrategy> {
    match kind {
        StrategyKind::Threshold => Box::new(ThresholdStrategy),
        StrategyKind::Percentile => Box::new(PercentileStrategy),
        StrategyKind::Clustering => Box::new(ClusteringStrategy),
        StrategyKind::Ensemble => Box::new(EnsembleStrategy),
        StrategyKind::Adaptive => Box::new(AdaptiveStrategy),
    }
}

/// Enabled metrics that are present in at least one vector, in declaration order.
pub(crate) fn present_metrics(vectors: &[QualityVector], enabled: &[Metric]) -> Vec<Metric> {
    let mut metrics: Vec<Metric> = enabled
        .iter()
        .copied()
        .filter(|&m| vectors.iter().any(|v| v.contains(m)))
        .collect();
    metrics.sort();
    metrics.dedup();
    metrics
}
