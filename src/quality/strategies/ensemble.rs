use crate::pipeline::{FilterConfig, StrategyKind};
use crate::quality::QualityVector;

use super::{
    ClusteringStrategy, FilterStrategy, PercentileStrategy, StrategyEvaluation, ThresholdStrategy,
    Verdict,
};

/// Keeps only images that threshold, percentile, and clustering filtering all keep.
///
/// Each member strategy runs independently on the full batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsembleStrategy;

impl FilterStrategy for EnsembleStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Ensemble
    }

    fn evaluate(&self, vectors: &[QualityVector], config: &FilterConfig) -> StrategyEvaluation {
        let members: [(&str, StrategyEvaluation); 3] = [
            ("threshold", ThresholdStrategy.evaluate(vectors, config)),
            ("percentile", PercentileStrategy.evaluate(vectors, config)),
            ("clustering", ClusteringStrategy.evaluate(vectors, config)),
        ];

        let verdicts = (0..vectors.len())
            .map(|i| {
                let reasons: Vec<String> = members
                    .iter()
                    .flat_map(|(name, evaluation)| {
                        evaluation.verdicts[i]
                            .reasons
                            .iter()
                            .map(move |reason| format!("{}: {}", name, reason))
                    })
                    .collect();
                let kept = members.iter().all(|(_, e)| e.verdicts[i].retained);
                if kept {
                    Verdict::keep()
                } else {
                    Verdict::reject(reasons)
                }
            })
            .collect();

        let [_, (_, percentile), _] = members;
        StrategyEvaluation {
            verdicts,
            percentiles: percentile.percentiles,
            resolved: None,
        }
    }
}
