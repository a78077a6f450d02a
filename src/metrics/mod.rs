//! Metrics module for Prometheus-based monitoring.
//!
//! Records assessment throughput, scorer health, cache effectiveness,
//! filtering decisions, and diversity removals.
//!
//! # Example
//!
//! ```ignore
//! use curaforge::metrics::{init_metrics, export_metrics, MetricsCollector};
//!
//! init_metrics().expect("Failed to initialize metrics");
//!
//! let collector = MetricsCollector::new();
//! collector.record_filter("ensemble", 12, 88);
//!
//! let metrics_text = export_metrics();
//! ```

pub mod collectors;
pub mod prometheus;

pub use collectors::MetricsCollector;
pub use prometheus::{export_metrics, init_metrics};

pub use prometheus::{
    ASSESSMENT_DURATION, CACHE_LOOKUPS_TOTAL, DIVERSITY_REMOVED_TOTAL, FILTER_DECISIONS_TOTAL,
    IMAGES_ASSESSED_TOTAL, METRICS_OMITTED_TOTAL, REGISTRY, RETENTION_RATE, SCORER_CALLS_TOTAL,
    STAGE_DURATION,
};
