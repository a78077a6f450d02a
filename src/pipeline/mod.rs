//! Curation pipeline for generated image datasets.
//!
//! This module ties quality assessment, filtering and diversity optimization
//! into a single session-scoped engine.
//!
//! # Architecture
//!
//! - **Config**: `FilterConfig`, loaded from YAML/JSON and `CURATE_*` variables
//! - **Engine**: `CurationEngine`, which owns the quality cache and report history
//!
//! # Pipeline Flow
//!
//! 1. **Assessment**: Every image gets a quality vector, computed once per session
//! 2. **Filtering**: The configured strategy decides which images pass
//! 3. **Diversity**: Dense clusters of similar passing images are capped
//! 4. **Reporting**: A filter report is recorded in the bounded history
//!
//! # Example
//!
//! ```rust,ignore
//! use curaforge::pipeline::{CurationEngine, FilterConfig, StrategyKind};
//!
//! let config = FilterConfig::from_file("curate.yaml")?
//!     .with_env_overrides()?
//!     .with_strategy(StrategyKind::Threshold);
//!
//! let engine = CurationEngine::new(config)?;
//! let outcome = engine.curate(&images).await;
//!
//! println!("{}", outcome.filter_report.summary());
//! for curated in &outcome.retained {
//!     println!("{} scored {:.3}", curated.id, curated.quality_score);
//! }
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! // Via builder pattern
//! let config = FilterConfig::default()
//!     .with_enabled_metrics([Metric::Brightness, Metric::Sharpness])
//!     .with_bounds(Metric::Brightness, 0.2, 0.8)
//!     .with_max_images_per_cluster(2);
//!
//! // Via environment variables
//! let config = FilterConfig::from_env()?;
//! ```

pub mod config;
pub mod orchestrator;

pub use config::{default_bounds, DiversityFeature, FilterConfig, MetricBounds, StrategyKind};
pub use orchestrator::{CuratedImage, CurationEngine, CurationOutcome, Provenance};
