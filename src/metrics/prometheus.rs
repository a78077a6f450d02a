//! Prometheus metrics registration and export.
//!
//! This module defines all Prometheus metrics used by curaforge and provides
//! functions for initializing, registering, and exporting metrics.

use prometheus::{
    Counter, CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all curaforge metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Total number of images whose quality vector was computed.
pub static IMAGES_ASSESSED_TOTAL: OnceLock<Counter> = OnceLock::new();

/// Per-image assessment duration in seconds.
pub static ASSESSMENT_DURATION: OnceLock<Histogram> = OnceLock::new();

/// Total enabled metrics that could not be computed.
pub static METRICS_OMITTED_TOTAL: OnceLock<Counter> = OnceLock::new();

/// Neural scorer calls, labeled by outcome (success, timeout, error).
pub static SCORER_CALLS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Quality cache lookups, labeled by result (hit, miss).
pub static CACHE_LOOKUPS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Filtering decisions, labeled by strategy and decision (retained, rejected).
pub static FILTER_DECISIONS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Retention rate of the most recent filtering run, labeled by strategy.
pub static RETENTION_RATE: OnceLock<GaugeVec> = OnceLock::new();

/// Total images dropped by the diversity optimizer.
pub static DIVERSITY_REMOVED_TOTAL: OnceLock<Counter> = OnceLock::new();

/// Stage durations in seconds, labeled by stage (assess, filter, diversity).
pub static STAGE_DURATION: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize all metrics and register them with the registry.
///
/// Call once at startup. Repeated calls leave the first registration in place.
///
/// # Errors
///
/// Returns a `prometheus::Error` if metric registration fails.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let registry = Registry::new();

    // Assessment metrics
    let images_assessed_total = Counter::new(
        "curaforge_images_assessed_total",
        "Total number of images whose quality vector was computed",
    )?;

    let assessment_duration = Histogram::with_opts(
        HistogramOpts::new(
            "curaforge_assessment_duration_seconds",
            "Per-image quality assessment duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
    )?;

    let metrics_omitted_total = Counter::new(
        "curaforge_metrics_omitted_total",
        "Total enabled metrics that could not be computed",
    )?;

    let scorer_calls_total = CounterVec::new(
        Opts::new("curaforge_scorer_calls_total", "Neural scorer calls by outcome"),
        &["outcome"],
    )?;

    let cache_lookups_total = CounterVec::new(
        Opts::new("curaforge_cache_lookups_total", "Quality cache lookups by result"),
        &["result"],
    )?;

    // Filtering metrics
    let filter_decisions_total = CounterVec::new(
        Opts::new(
            "curaforge_filter_decisions_total",
            "Filtering decisions by strategy and decision",
        ),
        &["strategy", "decision"],
    )?;

    let retention_rate = GaugeVec::new(
        Opts::new(
            "curaforge_retention_rate",
            "Retention rate of the most recent filtering run",
        ),
        &["strategy"],
    )?;

    // Diversity metrics
    let diversity_removed_total = Counter::new(
        "curaforge_diversity_removed_total",
        "Total images dropped by the diversity optimizer",
    )?;

    let stage_duration = HistogramVec::new(
        HistogramOpts::new(
            "curaforge_stage_duration_seconds",
            "Curation stage duration in seconds",
        )
        .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0]),
        &["stage"],
    )?;

    registry.register(Box::new(images_assessed_total.clone()))?;
    registry.register(Box::new(assessment_duration.clone()))?;
    registry.register(Box::new(metrics_omitted_total.clone()))?;
    registry.register(Box::new(scorer_calls_total.clone()))?;
    registry.register(Box::new(cache_lookups_total.clone()))?;
    registry.register(Box::new(filter_decisions_total.clone()))?;
    registry.register(Box::new(retention_rate.clone()))?;
    registry.register(Box::new(diversity_removed_total.clone()))?;
    registry.register(Box::new(stage_duration.clone()))?;

    // If any of these fail, metrics were already initialized (idempotent)
    let _ = REGISTRY.set(registry);
    let _ = IMAGES_ASSESSED_TOTAL.set(images_assessed_total);
    let _ = ASSESSMENT_DURATION.set(assessment_duration);
    let _ = METRICS_OMITTED_TOTAL.set(metrics_omitted_total);
    let _ = SCORER_CALLS_TOTAL.set(scorer_calls_total);
    let _ = CACHE_LOOKUPS_TOTAL.set(cache_lookups_total);
    let _ = FILTER_DECISIONS_TOTAL.set(filter_decisions_total);
    let _ = RETENTION_RATE.set(retention_rate);
    let _ = DIVERSITY_REMOVED_TOTAL.set(diversity_removed_total);
    let _ = STAGE_DURATION.set(stage_duration);

    tracing::info!("Prometheus metrics initialized successfully");

    Ok(())
}

/// Export all registered metrics in Prometheus text format.
///
/// Returns an explanatory comment line if the registry has not been
/// initialized or encoding fails.
pub fn export_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return "# Metrics not initialized. Call init_metrics() first.\n".to_string();
    };

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}\n", e);
    }

    String::from_utf8(buffer)
        .unwrap_or_else(|e| format!("# Error converting metrics to UTF-8: {}\n", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics() {
        // Global state: another test may have initialized first.
        let result = init_metrics();
        assert!(result.is_ok() || REGISTRY.get().is_some());
    }

    #[test]
    fn test_export_metrics_never_empty() {
        let metrics = export_metrics();
        assert!(!metrics.is_empty());
    }

    #[test]
    fn test_metrics_after_init() {
        let _ = init_metrics();

        if let Some(counter) = IMAGES_ASSESSED_TOTAL.get() {
            counter.inc();
        }
        let metrics = export_metrics();
        assert!(!metrics.starts_with("# Error"));
        assert!(metrics.contains("curaforge_images_assessed_total"));
    }
}
