use crate::pipeline::{FilterConfig, StrategyKind};
use crate::quality::QualityVector;

use super::{FilterStrategy, StrategyEvaluation, Verdict};

/// Keeps an image iff every present metric lies within its configured bounds.
///
/// Absent metrics are not evaluated. Every violated bound is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdStrategy;

impl ThresholdStrategy {
    /// Reasons `vector` violates the configured bounds; empty when it passes.
    pub fn violations(vector: &QualityVector, config: &FilterConfig) -> Vec<String> {
        let mut reasons = Vec::new();
        for (metric, value) in vector.iter() {
            let bounds = config.bounds_for(metric);
            if value.is_nan() {
                reasons.push(format!("{} is not a number", metric));
            } else if value < bounds.min {
                reasons.push(format!(
                    "{} {:.3} below minimum {:.3}",
                    metric, value, bounds.min
                ));
            } else if value > bounds.max {
                reasons.push(format!(
                    "{} {:.3} above maximum {:.3}",
                    metric, value, bounds.max
                ));
            }
        }
        reasons
    }
}

impl FilterStrategy for ThresholdStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Threshold
    }

    fn evaluate(&self, vectors: &[QualityVector], config: &FilterConfig) -> StrategyEvaluation {
        let verdicts = vectors
            .iter()
            .map(|vector| {
                let reasons = Self::violations(vector, config);
                if reasons.is_empty() {
                    Verdict::keep()
                } else {
                    Verdict::reject(reasons)
                }
            })
            .collect();
        StrategyEvaluation::from_verdicts(verdicts)
    }
}
