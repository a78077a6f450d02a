//! Descriptive statistics over quality scores.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::quality::{Metric, QualityVector};

/// Summary statistics of one metric across a batch.
///
/// Only images where the metric was present contribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStatistics {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

impl MetricStatistics {
    /// Computes statistics over a set of values. Returns `None` when empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sorted = sorted_values(values);
        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            count: sorted.len(),
            mean,
            std: variance.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median: percentile(&sorted, 50.0),
        })
    }
}

/// Quartile cut points of one metric across a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl Quartiles {
    /// Computes quartiles over a set of values. Returns `None` when empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sorted = sorted_values(values);
        Some(Self {
            p25: percentile(&sorted, 25.0),
            p50: percentile(&sorted, 50.0),
            p75: percentile(&sorted, 75.0),
            p90: percentile(&sorted, 90.0),
        })
    }
}

/// Sorts values ascending, placing NaN last.
pub fn sorted_values(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by_key(|v| OrderedFloat(*v));
    sorted
}

/// Linear-interpolated percentile of an ascending slice.
///
/// `p` is in `[0, 100]`. Returns 0.0 for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let fraction = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

/// Present values of `metric` across a batch, in input order.
pub fn metric_values(vectors: &[QualityVector], metric: Metric) -> Vec<f64> {
    vectors.iter().filter_map(|v| v.get(metric)).collect()
}

/// Per-metric statistics for every metric present in at least one vector.
pub fn metric_statistics(
    vectors: &[QualityVector],
    metrics: &[Metric],
) -> BTreeMap<Metric, MetricStatistics> {
    metrics
        .iter()
        .filter_map(|&metric| {
            MetricStatistics::from_values(&metric_values(vectors, metric)).map(|s| (metric, s))
        })
        .collect()
}
