//! High-level metric recording for curation operations.
//!
//! The `MetricsCollector` wraps the raw Prometheus metrics and provides
//! convenient methods for each stage of a curation run. Every method is a
//! no-op until [`super::init_metrics`] has been called.

use super::prometheus::{
    ASSESSMENT_DURATION, CACHE_LOOKUPS_TOTAL, DIVERSITY_REMOVED_TOTAL, FILTER_DECISIONS_TOTAL,
    IMAGES_ASSESSED_TOTAL, METRICS_OMITTED_TOTAL, RETENTION_RATE, SCORER_CALLS_TOTAL,
    STAGE_DURATION,
};

/// Metrics collector for recording curation metrics.
///
/// # Example
///
/// ```ignore
/// use curaforge::metrics::{init_metrics, MetricsCollector};
///
/// init_metrics().expect("Failed to init metrics");
/// let collector = MetricsCollector::new();
/// collector.record_filter("threshold", 5, 15);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    /// Record one computed quality vector.
    ///
    /// # Arguments
    ///
    /// * `duration_secs` - Time spent assessing the image
    /// * `omitted` - Number of enabled metrics missing from the vector
    pub fn record_assessment(&self, duration_secs: f64, omitted: usize) {
        if let Some(assessed) = IMAGES_ASSESSED_TOTAL.get() {
            assessed.inc();
        }

        if let Some(duration) = ASSESSMENT_DURATION.get() {
            duration.observe(duration_secs);
        }

        if omitted > 0 {
            if let Some(omitted_total) = METRICS_OMITTED_TOTAL.get() {
                omitted_total.inc_by(omitted as f64);
            }
        }

        tracing::trace!(
            duration_secs = duration_secs,
            omitted = omitted,
            "Recorded assessment metric"
        );
    }

    /// Record a neural scorer call by outcome ("success", "timeout", "error").
    pub fn record_scorer_call(&self, outcome: &str) {
        if let Some(calls) = SCORER_CALLS_TOTAL.get() {
            calls.with_label_values(&[outcome]).inc();
        }

        tracing::trace!(outcome = outcome, "Recorded scorer call metric");
    }

    /// Record cache hits and misses accumulated over a batch.
    pub fn record_cache_lookups(&self, hits: u64, misses: u64) {
        if let Some(lookups) = CACHE_LOOKUPS_TOTAL.get() {
            lookups.with_label_values(&["hit"]).inc_by(hits as f64);
            lookups.with_label_values(&["miss"]).inc_by(misses as f64);
        }

        tracing::trace!(hits = hits, misses = misses, "Recorded cache lookup metric");
    }

    /// Record the outcome of a filtering run.
    pub fn record_filter(&self, strategy: &str, retained: usize, rejected: usize) {
        if let Some(decisions) = FILTER_DECISIONS_TOTAL.get() {
            decisions
                .with_label_values(&[strategy, "retained"])
                .inc_by(retained as f64);
            decisions
                .with_label_values(&[strategy, "rejected"])
                .inc_by(rejected as f64);
        }

        let total = retained + rejected;
        if total > 0 {
            if let Some(rate) = RETENTION_RATE.get() {
                rate.with_label_values(&[strategy])
                    .set(retained as f64 / total as f64);
            }
        }

        tracing::trace!(
            strategy = strategy,
            retained = retained,
            rejected = rejected,
            "Recorded filter metric"
        );
    }

    /// Record images dropped by the diversity optimizer.
    pub fn record_diversity(&self, removed: usize) {
        if let Some(removed_total) = DIVERSITY_REMOVED_TOTAL.get() {
            removed_total.inc_by(removed as f64);
        }

        tracing::trace!(removed = removed, "Recorded diversity metric");
    }

    /// Record how long a curation stage took.
    pub fn record_stage(&self, stage: &str, duration_secs: f64) {
        if let Some(durations) = STAGE_DURATION.get() {
            durations.with_label_values(&[stage]).observe(duration_secs);
        }

        tracing::trace!(stage = stage, duration_secs = duration_secs, "Recorded stage metric");
    }
}
