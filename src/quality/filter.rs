//! Batch filtering: applies the configured strategy and builds the report.
//!
//! Vectors are restricted to the enabled metrics here, once, before any
//! strategy sees them. Images with no assessable metric are rejected up front
//! and take no part in batch statistics.

use std::time::Instant;

use tracing::{debug, info};

use crate::candidate::CandidateImage;
use crate::pipeline::FilterConfig;
use crate::report::{metric_statistics, FilterReport};

use super::strategies::{strategy_for, Verdict};
use super::QualityVector;

/// Rejection reason for images without any enabled metric.
pub const NO_ASSESSABLE_METRICS: &str = "no assessable metrics";

/// Images kept by one filtering run, with the run's report.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Kept images, in input order.
    pub retained: Vec<CandidateImage>,
    /// Input positions of `retained`.
    pub retained_indices: Vec<usize>,
    pub report: FilterReport,
}

/// Filters `images` by their quality `vectors` under `config.strategy`.
///
/// `vectors[i]` belongs to `images[i]`; a missing vector counts as empty.
/// Never fails: an empty batch yields an empty outcome with a zero-count report.
pub fn filter_batch(
    images: &[CandidateImage],
    vectors: &[QualityVector],
    config: &FilterConfig,
) -> FilterOutcome {
    let started = Instant::now();

    let restricted: Vec<QualityVector> = (0..images.len())
        .map(|i| {
            vectors
                .get(i)
                .map(|v| v.restricted_to(&config.enabled_metrics))
                .unwrap_or_default()
        })
        .collect();

    let assessable: Vec<usize> = restricted
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_empty())
        .map(|(i, _)| i)
        .collect();
    let assessable_vectors: Vec<QualityVector> =
        assessable.iter().map(|&i| restricted[i].clone()).collect();

    let mut verdicts: Vec<Verdict> =
        vec![Verdict::reject(vec![NO_ASSESSABLE_METRICS.to_string()]); images.len()];

    let mut report = FilterReport::empty(config.strategy);
    if !assessable_vectors.is_empty() {
        let evaluation = strategy_for(config.strategy).evaluate(&assessable_vectors, config);
        for (&index, verdict) in assessable.iter().zip(evaluation.verdicts) {
            verdicts[index] = verdict;
        }
        report.percentiles = evaluation.percentiles;
        report.resolved_strategy = evaluation.resolved;
    }

    report.metric_statistics = metric_statistics(&assessable_vectors, &config.enabled_metrics);

    let mut retained = Vec::new();
    let mut retained_indices = Vec::new();
    for (index, (image, verdict)) in images.iter().zip(verdicts).enumerate() {
        if verdict.retained {
            retained.push(image.clone());
            retained_indices.push(index);
        } else {
            debug!(image = %image.id(), reasons = ?verdict.reasons, "Image rejected");
            report
                .rejection_reasons
                .entry(image.id().clone())
                .or_default()
                .extend(verdict.reasons);
        }
    }

    let report = report
        .with_counts(images.len(), retained.len())
        .with_duration(started.elapsed());

    info!(
        strategy = %config.strategy,
        input = report.input_count,
        retained = report.retained_count,
        rejected = report.rejected_count,
        unassessable = images.len() - assessable.len(),
        "{}",
        report.summary()
    );

    FilterOutcome {
        retained,
        retained_indices,
        report,
    }
}
