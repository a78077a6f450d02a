//! curaforge: Quality filtering and diversity curation for generated images.
//!
//! This library scores candidate images on pixel-level and learned quality
//! metrics, filters them under a configurable strategy, and thins out
//! near-duplicates before they reach a training dataset.

// Core modules
pub mod candidate;
pub mod cli;
pub mod diversity;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod quality;
pub mod report;

// Re-export commonly used types
pub use candidate::{CandidateImage, ImageId};
pub use error::{ConfigError, CurationError, MetricError, ScorerError};
pub use pipeline::{CuratedImage, CurationEngine, CurationOutcome, FilterConfig, StrategyKind};
pub use quality::{Metric, NeuralScorer, NeuralScores, QualityCache, QualityVector};
pub use report::{DiversityReport, FilterReport};
