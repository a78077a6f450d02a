//! Image quality assessment and filtering.
//!
//! Assessment turns each candidate image into a sparse [`QualityVector`]:
//! ten pixel-domain metrics from the [`MetricSuite`] plus up to three scores
//! from an injected [`NeuralScorer`], memoized per image in a session-scoped
//! [`QualityCache`]. Filtering then applies one of five strategies to the
//! assessed batch and produces a [`crate::report::FilterReport`].

mod assessor;
mod cache;
pub mod filter;
pub mod metrics;
pub mod pixels;
mod scorer;
pub mod strategies;
mod vector;

pub use assessor::QualityAssessor;
pub use cache::{CacheStats, QualityCache};
pub use filter::{filter_batch, FilterOutcome, NO_ASSESSABLE_METRICS};
pub use metrics::MetricSuite;
pub use scorer::{score_with_timeout, FixedScorer, NeuralScorer, NeuralScores, NoopScorer};
pub use strategies::{
    strategy_for, AdaptiveDecision, AdaptiveStrategy, ClusteringStrategy, EnsembleStrategy,
    FilterStrategy, PercentileStrategy, StrategyEvaluation, ThresholdStrategy, Verdict,
};
pub use vector::{Metric, QualityVector};
