//! Diversity optimization for quality-filtered image sets.
//!
//! Near-duplicate outputs are common in generated datasets. This module
//! bounds that redundancy after filtering, without ever overriding the
//! quality decision: it only removes images, never adds them.
//!
//! This module provides four main components:
//!
//! 1. **Features** - Convert images to unit vectors of appearance descriptors
//! 2. **Distance** - Euclidean geometry and column standardization
//! 3. **DBSCAN** - Density clustering with a fixed radius
//! 4. **Optimizer** - Caps each dense cluster, preferring higher quality
//!
//! # Usage
//!
//! ```rust,ignore
//! use curaforge::diversity::{DiversityOptimizer, FeatureExtractor};
//!
//! let optimizer = DiversityOptimizer::new(FeatureExtractor::default(), 2, 0.5);
//! let selection = optimizer.select(&images, &quality_scores);
//! println!("{}", selection.report.summary());
//! ```

pub mod dbscan;
pub mod distance;
pub mod features;
pub mod optimizer;

pub use dbscan::{ClusterLabel, Dbscan};
pub use distance::{euclidean_distance, l2_normalize, pairwise_euclidean_distance, standardize_columns};
pub use features::FeatureExtractor;
pub use optimizer::{DiversityOptimizer, DiversitySelection};
