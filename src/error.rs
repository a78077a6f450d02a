//! Error types for curation operations.
//!
//! Defines error types for each failure domain of the engine:
//! - Per-metric computation failures (absorbed, never fatal)
//! - Neural scorer failures (absorbed, never fatal)
//! - Configuration validation (fails fast)
//! - Candidate image construction

use std::time::Duration;

use thiserror::Error;

use crate::quality::Metric;

/// Errors raised by a single pixel metric on a single image.
///
/// These never abort a batch: the metric is omitted from the image's
/// quality vector and the remaining metrics are still computed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetricError {
    #[error("{metric} requires at least {required}x{required} pixels, got {height}x{width}")]
    TooSmall {
        metric: Metric,
        required: usize,
        height: usize,
        width: usize,
    },

    #[error("{metric} requires at least {required} channels, got {channels}")]
    UnsupportedChannels {
        metric: Metric,
        required: usize,
        channels: usize,
    },

    #[error("{metric} is undefined for this image: {reason}")]
    Degenerate { metric: Metric, reason: String },
}

/// Errors raised by the external neural scorer.
///
/// Treated the same way as [`MetricError`]: the scorer's metrics are
/// omitted for that image and the batch continues.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScorerError {
    #[error("Neural scorer timed out after {0:?}")]
    Timeout(Duration),

    #[error("Neural scorer unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while loading or validating a [`crate::pipeline::FilterConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid bounds for {metric}: min {min} is greater than max {max}")]
    InvalidBounds { metric: Metric, min: f64, max: f64 },

    #[error("Unknown filtering strategy '{0}'")]
    UnknownStrategy(String),

    #[error("Unknown quality metric '{0}'")]
    UnknownMetric(String),

    #[error("Unknown diversity feature '{0}'")]
    UnknownFeature(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level errors surfaced by the curation engine.
#[derive(Debug, Error)]
pub enum CurationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid candidate image: {0}")]
    InvalidImage(String),
}
