use std::collections::BTreeMap;

use crate::pipeline::{FilterConfig, StrategyKind};
use crate::quality::{Metric, QualityVector};
use crate::report::stats::metric_values;
use crate::report::Quartiles;

use super::{present_metrics, FilterStrategy, StrategyEvaluation, Verdict};

/// Minimum mean bucket score for an image to be kept.
pub const PERCENTILE_RETENTION_SCORE: f64 = 0.6;

/// Scores a value against the batch quartiles of its metric.
pub fn bucket_score(value: f64, quartiles: &Quartiles) -> f64 {
    if value >= quartiles.p75 {
        1.0
    } else if value >= quartiles.p50 {
        0.75
    } else if value >= quartiles.p25 {
        0.5
    } else {
        0.25
    }
}

/// Ranks each image against the batch: the mean bucket score over its
/// present metrics must reach [`PERCENTILE_RETENTION_SCORE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentileStrategy;

impl PercentileStrategy {
    pub fn quartiles(vectors: &[QualityVector], config: &FilterConfig) -> BTreeMap<Metric, Quartiles> {
        present_metrics(vectors, &config.enabled_metrics)
            .into_iter()
            .filter_map(|metric| {
                Quartiles::from_values(&metric_values(vectors, metric)).map(|q| (metric, q))
            })
            .collect()
    }
}

impl FilterStrategy for PercentileStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Percentile
    }

    fn evaluate(&self, vectors: &[QualityVector], config: &FilterConfig) -> StrategyEvaluation {
        let percentiles = Self::quartiles(vectors, config);

        let verdicts = vectors
            .iter()
            .map(|vector| {
                let scores: Vec<f64> = vector
                    .iter()
                    .filter_map(|(metric, value)| {
                        percentiles.get(&metric).map(|q| bucket_score(value, q))
                    })
                    .collect();
                if scores.is_empty() {
                    return Verdict::reject(vec!["no metrics to rank".to_string()]);
                }

                let score = scores.iter().sum::<f64>() / scores.len() as f64;
                if score >= PERCENTILE_RETENTION_SCORE {
                    Verdict::keep()
                } else {
                    Verdict::reject(vec![format!(
                        "percentile score {:.3} below {:.3}",
                        score, PERCENTILE_RETENTION_SCORE
                    )])
                }
            })
            .collect();

        StrategyEvaluation {
            verdicts,
            percentiles,
            resolved: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        let q = Quartiles {
            p25: 0.25,
            p50: 0.5,
            p75: 0.75,
            p90: 0.9,
        };
        assert_eq!(bucket_score(0.75, &q), 1.0);
        assert_eq!(bucket_score(0.6, &q), 0.75);
        assert_eq!(bucket_score(0.25, &q), 0.5);
        assert_eq!(bucket_score(0.1, &q), 0.25);
    }

    #[test]
    fn test_keeps_upper_half() {
        // Quartiles of 0.1..=0.8: p25 = 0.275, p50 = 0.45, p75 = 0.625.
        let vectors = brightness_batch(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]);
        let evaluation = PercentileStrategy.evaluate(&vectors, &brightness_config());

        assert_eq!(evaluation.retained_indices(), vec![4, 5, 6, 7]);
        assert!(evaluation.verdicts[0].reasons[0].starts_with("percentile score 0.250"));
        assert!(evaluation.percentiles.contains_key(&Metric::Brightness));
    }

    #[test]
    fn test_uniform_batch_is_fully_kept() {
        let vectors = brightness_batch(&[0.4; 6]);
        let evaluation = PercentileStrategy.evaluate(&vectors, &brightness_config());
        assert_eq!(evaluation.retained_count(), 6);
    }

    #[test]
    fn test_averages_over_present_metrics() {
        // Brightness quartiles: p25 0.35, p50 0.5, p75 0.65.
        // Contrast quartiles: p25 0.25, p50 0.5, p75 0.75.
        let config = FilterConfig::default().with_enabled_metrics([Metric::Brightness, Metric::Contrast]);
        let vectors = vec![
            vector(&[(Metric::Brightness, 0.8), (Metric::Contrast, 0.1)]),
            vector(&[(Metric::Brightness, 0.2), (Metric::Contrast, 0.9)]),
            vector(&[(Metric::Brightness, 0.6)]),
            vector(&[(Metric::Brightness, 0.4), (Metric::Contrast, 0.3)]),
            vector(&[(Metric::Contrast, 0.7)]),
        ];
        let evaluation = PercentileStrategy.evaluate(&vectors, &config);

        assert_eq!(evaluation.retained_indices(), vec![0, 1, 2, 4]);
        assert!(evaluation.verdicts[3].reasons[0].starts_with("percentile score 0.500"));
    }

    #[test]
    fn test_values_on_a_quartile_take_the_upper_bucket() {
        // Quartiles of [0.1, 0.1, 0.9, 0.9]: p25 = 0.1, p50 = 0.5, p75 = 0.9.
        let vectors = brightness_batch(&[0.1, 0.1, 0.9, 0.9]);
        let evaluation = PercentileStrategy.evaluate(&vectors, &brightness_config());
        let q = evaluation.percentiles[&Metric::Brightness];

        assert_eq!(q.p25, 0.1);
        assert_eq!(bucket_score(0.1, &q), 0.5);
        assert_eq!(bucket_score(0.9, &q), 1.0);
        assert_eq!(evaluation.retained_indices(), vec![2, 3]);

        // Mixed ties: 0.5 on brightness p25 and 0.75 on contrast p50 average to 0.625.
        let config = FilterConfig::default().with_enabled_metrics([Metric::Brightness, Metric::Contrast]);
        let vectors = vec![
            vector(&[(Metric::Brightness, 0.9), (Metric::Contrast, 0.1)]),
            vector(&[(Metric::Brightness, 0.1), (Metric::Contrast, 0.9)]),
            vector(&[(Metric::Brightness, 0.9)]),
            vector(&[(Metric::Brightness, 0.1), (Metric::Contrast, 0.1)]),
        ];
        let evaluation = PercentileStrategy.evaluate(&vectors, &config);
        assert!(evaluation.verdicts[3].retained);
    }
}
