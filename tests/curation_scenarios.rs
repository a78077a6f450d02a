//! End-to-end curation scenarios over synthetic image batches.

use std::collections::HashSet;
use std::sync::Arc;

use curaforge::diversity::{DiversityOptimizer, FeatureExtractor};
use curaforge::quality::metrics::resolution_quality;
use curaforge::quality::QualityCache;
use curaforge::{CandidateImage, CurationEngine, FilterConfig, ImageId, Metric, StrategyKind};
use ndarray::Array3;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Image whose samples are drawn uniformly from `low..=high`.
fn noisy_image(id: &str, seed: u64, low: u8, high: u8) -> CandidateImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let palette: Vec<u8> = (low..=high).collect();
    let data: Vec<u8> = (0..32 * 32 * 3)
        .map(|_| *palette.choose(&mut rng).expect("non-empty palette"))
        .collect();
    let pixels = Array3::from_shape_vec((32, 32, 3), data).expect("shape");
    CandidateImage::with_id(id, pixels)
}

/// A mixed batch spanning dark, mid and bright images.
fn mixed_batch(count: usize) -> Vec<CandidateImage> {
    (0..count)
        .map(|i| {
            let low = ((i * 37) % 200) as u8;
            noisy_image(&format!("img-{:02}", i), i as u64, low, low + 55)
        })
        .collect()
}

/// Five pixel-identical mid-grey images and fifteen overexposed ones.
fn duplicate_heavy_batch() -> Vec<CandidateImage> {
    let mut images: Vec<CandidateImage> = (0..5)
        .map(|i| CandidateImage::with_id(format!("mid-{}", i), Array3::from_elem((32, 32, 3), 128)))
        .collect();
    images.extend((0..15).map(|i| noisy_image(&format!("bright-{:02}", i), 100 + i, 237, 247)));
    images
}

fn brightness_only() -> FilterConfig {
    FilterConfig::default()
        .with_enabled_metrics([Metric::Brightness])
        .with_bounds(Metric::Brightness, 0.1, 0.9)
}

fn ids(images: &[CandidateImage]) -> HashSet<ImageId> {
    images.iter().map(|i| i.id().clone()).collect()
}

#[tokio::test]
async fn threshold_then_diversity_on_duplicate_heavy_batch() {
    let engine = CurationEngine::new(
        brightness_only()
            .with_strategy(StrategyKind::Threshold)
            .with_max_images_per_cluster(2),
    )
    .expect("valid config");
    let images = duplicate_heavy_batch();

    let outcome = engine.curate(&images).await;

    let report = &outcome.filter_report;
    assert_eq!(report.input_count, 20);
    assert_eq!(report.retained_count, 5);
    assert_eq!(report.rejected_count, 15);
    assert!(report
        .rejection_reasons
        .keys()
        .all(|id| id.as_str().starts_with("bright-")));

    assert!(outcome.retained.len() <= 2);
    assert!(outcome
        .retained
        .iter()
        .all(|c| c.id.as_str().starts_with("mid-")));
    let diversity = outcome.diversity_report.expect("diversity enabled");
    assert_eq!(diversity.input_count, 5);
    assert_eq!(diversity.output_count, outcome.retained.len());
}

#[tokio::test]
async fn every_strategy_accounts_for_every_image() {
    let images = mixed_batch(24);
    let cache = Arc::new(QualityCache::new());

    for strategy in StrategyKind::ALL {
        let engine = CurationEngine::new(FilterConfig::default().with_strategy(strategy))
            .expect("valid config")
            .with_cache(Arc::clone(&cache));
        let vectors = engine.assess(&images).await;
        let outcome = engine.filter(&images, &vectors);
        let report = &outcome.report;

        assert_eq!(report.input_count, images.len(), "{}", strategy);
        assert_eq!(
            report.retained_count + report.rejected_count,
            report.input_count,
            "{}",
            strategy
        );
        assert_eq!(report.rejection_reasons.len(), report.rejected_count);
        assert_eq!(outcome.retained.len(), report.retained_count);
    }
}

#[tokio::test]
async fn ensemble_is_a_subset_of_each_member() {
    let images = mixed_batch(30);
    let cache = Arc::new(QualityCache::new());
    let retained_by = |strategy: StrategyKind| {
        let cache = Arc::clone(&cache);
        let images = images.clone();
        async move {
            let engine = CurationEngine::new(FilterConfig::default().with_strategy(strategy))
                .expect("valid config")
                .with_cache(cache);
            let vectors = engine.assess(&images).await;
            ids(&engine.filter(&images, &vectors).retained)
        }
    };

    let ensemble = retained_by(StrategyKind::Ensemble).await;
    for member in [
        StrategyKind::Threshold,
        StrategyKind::Percentile,
        StrategyKind::Clustering,
    ] {
        let kept = retained_by(member).await;
        assert!(ensemble.is_subset(&kept), "ensemble kept more than {}", member);
    }
}

#[tokio::test]
async fn warm_cache_reproduces_cold_run() {
    let engine = CurationEngine::new(FilterConfig::default()).expect("valid config");
    let images = mixed_batch(12);

    let cold = engine.curate(&images).await;
    let misses_after_cold = engine.cache().stats().misses;
    let warm = engine.curate(&images).await;

    assert_eq!(engine.cache().stats().misses, misses_after_cold);
    assert_eq!(engine.cache().len(), images.len());
    assert_eq!(cold.retained_ids(), warm.retained_ids());
    assert_eq!(
        cold.filter_report.rejection_reasons,
        warm.filter_report.rejection_reasons
    );
    assert_eq!(engine.history().len(), 2);
}

#[tokio::test]
async fn concurrency_does_not_change_quality_vectors() {
    let images = mixed_batch(10);
    let serial = CurationEngine::new(FilterConfig::default().with_concurrency_limit(1))
        .expect("valid config")
        .assess(&images)
        .await;
    let parallel = CurationEngine::new(FilterConfig::default().with_concurrency_limit(8))
        .expect("valid config")
        .assess(&images)
        .await;

    assert_eq!(serial, parallel);
}

#[tokio::test]
async fn adaptive_run_reports_its_resolution() {
    let engine = CurationEngine::new(brightness_only().with_strategy(StrategyKind::Adaptive))
        .expect("valid config");
    let outcome = engine.curate(&mixed_batch(16)).await;

    let resolved = outcome
        .filter_report
        .resolved_strategy
        .expect("adaptive resolves to a concrete strategy");
    assert_ne!(resolved, StrategyKind::Adaptive);
    assert!(outcome
        .retained
        .iter()
        .all(|c| c.provenance.resolved_strategy == Some(resolved)));
}

#[test]
fn diversity_output_is_an_ordered_subset() {
    let images = mixed_batch(20);
    let quality: Vec<f64> = (0..images.len()).map(|i| (i % 7) as f64 / 7.0).collect();
    let optimizer = DiversityOptimizer::new(FeatureExtractor::default(), 2, 0.5);

    let selection = optimizer.select(&images, &quality);
    let indices = &selection.selected_indices;
    assert!(indices.len() <= images.len());
    assert!(indices.windows(2).all(|w| w[0] < w[1]));
    assert!(indices.iter().all(|&i| i < images.len()));
    assert_eq!(
        selection.report.removed_count() + indices.len(),
        images.len()
    );
}

#[test]
fn near_duplicates_with_pixel_noise_fall_back_to_noise_backfill() {
    // Standardization stretches tiny per-image differences to unit scale,
    // so jittered copies are isolated points rather than one dense cluster.
    let images: Vec<CandidateImage> = (0..5)
        .map(|i| noisy_image(&format!("jitter-{}", i), 500 + i, 127, 129))
        .collect();
    let selection =
        DiversityOptimizer::new(FeatureExtractor::default(), 2, 0.5).select(&images, &[0.5; 5]);

    let report = &selection.report;
    assert_eq!(report.cluster_count, 0);
    assert_eq!(report.noise_count, 5);
    assert_eq!(report.backfilled_count, 5);
    assert_eq!(selection.selected_indices, vec![0, 1, 2, 3, 4]);
    assert!(report.removed.is_empty());
}

#[test]
fn diversity_is_a_noop_within_cluster_cap() {
    let images = vec![
        CandidateImage::with_id("a", Array3::from_elem((8, 8, 3), 10)),
        CandidateImage::with_id("b", Array3::from_elem((8, 8, 3), 10)),
    ];
    let selection =
        DiversityOptimizer::new(FeatureExtractor::default(), 2, 0.5).select(&images, &[0.1, 0.2]);

    assert_eq!(selection.selected_indices, vec![0, 1]);
    assert!(selection.report.skipped);
}

#[test]
fn resolution_quality_steps_at_boundaries() {
    assert_eq!(resolution_quality(1024, 1024), Ok(1.0));
    assert_eq!(resolution_quality(512, 2048), Ok(0.8));
    assert_eq!(resolution_quality(256, 256), Ok(0.6));
    assert_eq!(resolution_quality(100, 100), Ok(0.4));
}

#[test]
fn invalid_configuration_is_rejected_before_any_work() {
    let config = FilterConfig::default().with_bounds(Metric::Sharpness, 0.8, 0.2);
    assert!(CurationEngine::new(config).is_err());
}
