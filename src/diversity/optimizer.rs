//! Post-filter redundancy reduction.
//!
//! Groups the retained images by appearance and caps how many members of
//! each dense group survive, preferring higher quality. Output is always a
//! subset of the input and keeps input order.

use std::collections::BTreeMap;
use std::time::Instant;

use ndarray::Array2;
use tracing::{debug, info};

use crate::candidate::CandidateImage;
use crate::pipeline::FilterConfig;
use crate::report::DiversityReport;

use super::dbscan::{ClusterLabel, Dbscan};
use super::distance::standardize_columns;
use super::features::FeatureExtractor;

/// Minimum neighbourhood size (including the point itself) of a core point.
const MIN_SAMPLES: usize = 2;

/// Share of the input that may be dropped before noise points are restored.
const BACKFILL_RATIO: f64 = 0.2;

/// Selected subset of one diversity run.
#[derive(Debug, Clone)]
pub struct DiversitySelection {
    /// Input positions of the kept images, ascending.
    pub selected_indices: Vec<usize>,
    /// Cluster label per input position; empty when the run was skipped.
    pub labels: Vec<ClusterLabel>,
    pub report: DiversityReport,
}

/// Density-clustering diversity optimizer.
#[derive(Debug, Clone)]
pub struct DiversityOptimizer {
    extractor: FeatureExtractor,
    max_images_per_cluster: usize,
    min_diversity_distance: f64,
}

impl DiversityOptimizer {
    pub fn new(
        extractor: FeatureExtractor,
        max_images_per_cluster: usize,
        min_diversity_distance: f64,
    ) -> Self {
        Self {
            extractor,
            max_images_per_cluster: max_images_per_cluster.max(1),
            min_diversity_distance,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(
            FeatureExtractor::new(config.diversity_features.clone()),
            config.max_images_per_cluster,
            config.min_diversity_distance,
        )
    }

    pub fn max_images_per_cluster(&self) -> usize {
        self.max_images_per_cluster
    }

    /// Selects a diverse subset of `images`.
    ///
    /// `quality[i]` ranks `images[i]` within its cluster; missing scores count as 0.
    pub fn select(&self, images: &[CandidateImage], quality: &[f64]) -> DiversitySelection {
        if images.len() <= self.max_images_per_cluster {
            return self.skipped(images.len());
        }
        let features = self.extractor.extract_batch(images);
        let mut selection = self.select_features(&features, quality);
        selection.report.removed = (0..images.len())
            .filter(|i| selection.selected_indices.binary_search(i).is_err())
            .map(|i| images[i].id().clone())
            .collect();
        selection
    }

    /// Selects from precomputed feature rows.
    pub fn select_features(&self, features: &Array2<f64>, quality: &[f64]) -> DiversitySelection {
        let n = features.nrows();
        if n <= self.max_images_per_cluster {
            return self.skipped(n);
        }
        let started = Instant::now();

        let standardized = standardize_columns(features);
        let labels = Dbscan::new(self.min_diversity_distance, MIN_SAMPLES).fit(&standardized);

        let score = |i: usize| quality.get(i).copied().unwrap_or(0.0);
        let by_quality = |members: &mut Vec<usize>| {
            members.sort_by(|&a, &b| score(b).total_cmp(&score(a)).then(a.cmp(&b)));
        };

        let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut noise = Vec::new();
        for (i, label) in labels.iter().enumerate() {
            match label.cluster() {
                Some(cluster) => clusters.entry(cluster).or_default().push(i),
                None => noise.push(i),
            }
        }

        let mut selected: Vec<usize> = Vec::with_capacity(n);
        for (cluster, members) in clusters.iter_mut() {
            by_quality(members);
            let kept = members.len().min(self.max_images_per_cluster);
            debug!(
                cluster = *cluster,
                members = members.len(),
                kept = kept,
                "Selected cluster representatives"
            );
            selected.extend(members.iter().take(kept));
        }

        let removed = n - selected.len();
        let mut backfilled_count = 0;
        if removed as f64 > BACKFILL_RATIO * n as f64 {
            by_quality(&mut noise);
            let room = n - selected.len();
            backfilled_count = noise.len().min(room);
            selected.extend(noise.iter().take(backfilled_count));
        }
        selected.sort_unstable();

        let report = DiversityReport {
            input_count: n,
            output_count: selected.len(),
            cluster_count: clusters.len(),
            noise_count: noise.len(),
            backfilled_count,
            skipped: false,
            removed: Vec::new(),
            duration_secs: started.elapsed().as_secs_f64(),
        };
        info!(
            input = report.input_count,
            output = report.output_count,
            clusters = report.cluster_count,
            noise = report.noise_count,
            backfilled = report.backfilled_count,
            "{}",
            report.summary()
        );

        DiversitySelection {
            selected_indices: selected,
            labels,
            report,
        }
    }

    fn skipped(&self, n: usize) -> DiversitySelection {
        debug!(
            images = n,
            max_images_per_cluster = self.max_images_per_cluster,
            "Batch within cluster cap, skipping diversity optimization"
        );
        DiversitySelection {
            selected_indices: (0..n).collect(),
            labels: Vec::new(),
            report: DiversityReport {
                input_count: n,
                output_count: n,
                skipped: true,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::DiversityFeature;
    use ndarray::{array, Array3};

    fn optimizer(max_per_cluster: usize) -> DiversityOptimizer {
        DiversityOptimizer::new(FeatureExtractor::default(), max_per_cluster, 0.5)
    }

    #[test]
    fn test_small_input_is_noop() {
        let features = array![[0.0], [0.0], [0.0]];
        let selection = optimizer(3).select_features(&features, &[0.1, 0.2, 0.3]);
        assert_eq!(selection.selected_indices, vec![0, 1, 2]);
        assert!(selection.report.skipped);
    }

    #[test]
    fn test_caps_cluster_by_quality() {
        let features = Array2::zeros((5, 4));
        let quality = [0.2, 0.9, 0.5, 0.9, 0.1];
        let selection = optimizer(2).select_features(&features, &quality);

        // Ties on quality resolve to the earlier input.
        assert_eq!(selection.selected_indices, vec![1, 3]);
        assert_eq!(selection.report.cluster_count, 1);
        assert_eq!(selection.report.noise_count, 0);
        assert_eq!(selection.report.output_count, 2);
    }

    #[test]
    fn test_noise_is_backfilled_when_too_much_was_removed() {
        // Two dense pairs and three isolated points.
        let features = array![[0.0], [0.0], [10.0], [10.0], [20.0], [30.0], [40.0]];
        let quality = [0.5; 7];
        let selection = optimizer(1).select_features(&features, &quality);

        assert_eq!(selection.report.cluster_count, 2);
        assert_eq!(selection.report.noise_count, 3);
        assert_eq!(selection.report.backfilled_count, 3);
        assert_eq!(selection.selected_indices, vec![0, 2, 4, 5, 6]);
    }

    #[test]
    fn test_noise_is_dropped_when_removal_is_small() {
        // Eight points in four dense pairs plus two isolated points: dropping
        // only the noise removes exactly 20% of the input.
        let features = array![
            [0.0],
            [0.0],
            [10.0],
            [10.0],
            [20.0],
            [20.0],
            [30.0],
            [30.0],
            [45.0],
            [60.0]
        ];
        let selection = optimizer(2).select_features(&features, &[0.5; 10]);

        assert_eq!(selection.report.noise_count, 2);
        assert_eq!(selection.report.backfilled_count, 0);
        assert_eq!(selection.selected_indices, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_output_is_subset_in_input_order() {
        let features = array![[3.0], [0.0], [3.0], [0.0], [3.0], [9.0]];
        let quality = [0.1, 0.2, 0.9, 0.8, 0.5, 0.3];
        let selection = optimizer(1).select_features(&features, &quality);

        let indices = &selection.selected_indices;
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        assert!(indices.iter().all(|&i| i < 6));
        assert!(indices.contains(&2));
        assert!(indices.contains(&3));
    }

    #[test]
    fn test_select_reports_removed_ids() {
        let images: Vec<CandidateImage> = (0..4)
            .map(|i| CandidateImage::with_id(format!("dup-{}", i), Array3::from_elem((8, 8, 3), 90)))
            .collect();
        let optimizer = DiversityOptimizer::new(
            FeatureExtractor::new(vec![DiversityFeature::ColorHistogram]),
            1,
            0.5,
        );
        let selection = optimizer.select(&images, &[0.3, 0.4, 0.9, 0.1]);

        assert_eq!(selection.selected_indices, vec![2]);
        assert_eq!(selection.report.removed.len(), 3);
        assert_eq!(selection.report.removed_count(), 3);
    }
}
