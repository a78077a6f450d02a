//! Curation engine coordinating one session of dataset curation.
//!
//! This module provides the `CurationEngine` that coordinates:
//! - Batch quality assessment through the session cache
//! - Filtering under the configured strategy
//! - Diversity optimization of the filtered set
//! - Report history and operational metrics

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::candidate::{CandidateImage, ImageId};
use crate::diversity::{ClusterLabel, DiversityOptimizer, DiversitySelection};
use crate::error::ConfigError;
use crate::metrics::MetricsCollector;
use crate::quality::{
    filter_batch, FilterOutcome, NeuralScorer, QualityAssessor, QualityCache, QualityVector,
};
use crate::report::{DiversityReport, FilterReport, HistoryEntry, ReportHistory};

use super::config::{FilterConfig, StrategyKind};

/// How an image reached the final dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    /// Strategy selected for the run.
    pub strategy: StrategyKind,
    /// Strategy the adaptive policy resolved to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_strategy: Option<StrategyKind>,
    /// Always true for delivered images.
    pub passed_quality: bool,
    /// True when the diversity optimizer ran and kept this image.
    pub diversity_selected: bool,
    /// Diversity cluster, when clustering ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterLabel>,
}

/// An image delivered by a curation run.
#[derive(Debug, Clone, Serialize)]
pub struct CuratedImage {
    pub id: ImageId,
    #[serde(skip)]
    pub image: CandidateImage,
    pub quality: QualityVector,
    /// Mean of the enabled metrics present in `quality`.
    pub quality_score: f64,
    pub provenance: Provenance,
}

/// Result of a full curation run.
#[derive(Debug, Clone, Serialize)]
pub struct CurationOutcome {
    /// Delivered images, in input order.
    pub retained: Vec<CuratedImage>,
    pub filter_report: FilterReport,
    /// Absent when diversity optimization is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diversity_report: Option<DiversityReport>,
}

impl CurationOutcome {
    pub fn retained_ids(&self) -> Vec<&ImageId> {
        self.retained.iter().map(|c| &c.id).collect()
    }
}

/// Session-scoped curation engine.
///
/// Owns the quality cache for the session: images assessed by one call are
/// served from the cache by later calls until [`CurationEngine::clear_cache`].
pub struct CurationEngine {
    config: FilterConfig,
    assessor: QualityAssessor,
    optimizer: DiversityOptimizer,
    history: Mutex<ReportHistory>,
    collector: MetricsCollector,
}

impl std::fmt::Debug for CurationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurationEngine")
            .field("config", &self.config)
            .field("assessor", &self.assessor)
            .finish()
    }
}

impl CurationEngine {
    /// Creates an engine with a fresh cache and no neural scorer.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid. No image is
    /// touched before validation succeeds.
    pub fn new(config: FilterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let assessor = QualityAssessor::new(config.enabled_metrics.clone(), Arc::new(QualityCache::new()))
            .with_concurrency_limit(config.concurrency_limit)
            .with_scorer_timeout(config.scorer_timeout());
        let optimizer = DiversityOptimizer::from_config(&config);
        let history = Mutex::new(ReportHistory::new(config.history_capacity));

        info!(
            strategy = %config.strategy,
            metrics = config.enabled_metrics.len(),
            diversity = config.enable_diversity,
            concurrency = config.concurrency_limit,
            "Curation engine initialized"
        );

        Ok(Self {
            config,
            assessor,
            optimizer,
            history,
            collector: MetricsCollector::new(),
        })
    }

    /// Builder method to inject the neural scorer.
    pub fn with_scorer(mut self, scorer: Arc<dyn NeuralScorer>) -> Self {
        self.assessor = self.assessor.with_scorer(scorer);
        self
    }

    /// Builder method to use an existing session cache.
    pub fn with_cache(mut self, cache: Arc<QualityCache>) -> Self {
        self.assessor = self.assessor.with_cache(cache);
        self
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<QualityCache> {
        self.assessor.cache()
    }

    /// Drops every cached quality vector.
    pub fn clear_cache(&self) {
        self.assessor.cache().clear();
    }

    /// Assesses every image; returns vectors in input order.
    pub async fn assess(&self, images: &[CandidateImage]) -> Vec<QualityVector> {
        let start = Instant::now();
        let vectors = self.assessor.assess_batch(images).await;
        self.collector
            .record_stage("assess", start.elapsed().as_secs_f64());
        vectors
    }

    /// Filters an assessed batch and records the report in the history.
    pub fn filter(&self, images: &[CandidateImage], vectors: &[QualityVector]) -> FilterOutcome {
        let start = Instant::now();
        let outcome = filter_batch(images, vectors, &self.config);

        let report = &outcome.report;
        self.collector.record_filter(
            report.effective_strategy().as_str(),
            report.retained_count,
            report.rejected_count,
        );
        self.collector
            .record_stage("filter", start.elapsed().as_secs_f64());
        self.history
            .lock()
            .expect("report history lock poisoned")
            .push(report.clone());

        outcome
    }

    /// Reduces redundancy among `images`, ranking by their quality vectors.
    pub fn optimize_diversity(
        &self,
        images: &[CandidateImage],
        vectors: &[QualityVector],
    ) -> DiversitySelection {
        let start = Instant::now();
        let quality: Vec<f64> = vectors.iter().map(|v| self.quality_score(v)).collect();
        let selection = self.optimizer.select(images, &quality);

        self.collector
            .record_diversity(selection.report.removed_count());
        self.collector
            .record_stage("diversity", start.elapsed().as_secs_f64());
        selection
    }

    /// Runs assessment, filtering, and diversity optimization over one batch.
    ///
    /// Never fails: degraded metrics are omitted and an empty batch yields an
    /// empty outcome.
    pub async fn curate(&self, images: &[CandidateImage]) -> CurationOutcome {
        let start = Instant::now();
        warn_on_duplicate_ids(images);

        let vectors = self.assess(images).await;
        let filtered = self.filter(images, &vectors);
        let filtered_vectors: Vec<QualityVector> = filtered
            .retained_indices
            .iter()
            .map(|&i| vectors[i].clone())
            .collect();

        let (selected, labels, diversity_report) = if self.config.enable_diversity {
            let selection = self.optimize_diversity(&filtered.retained, &filtered_vectors);
            (
                selection.selected_indices,
                selection.labels,
                Some(selection.report),
            )
        } else {
            ((0..filtered.retained.len()).collect(), Vec::new(), None)
        };

        let report = &filtered.report;
        let retained: Vec<CuratedImage> = selected
            .into_iter()
            .map(|i| {
                let image = filtered.retained[i].clone();
                let quality = filtered_vectors[i].restricted_to(&self.config.enabled_metrics);
                CuratedImage {
                    id: image.id().clone(),
                    image,
                    quality_score: quality.mean_score(),
                    quality,
                    provenance: Provenance {
                        strategy: report.strategy,
                        resolved_strategy: report.resolved_strategy,
                        passed_quality: true,
                        diversity_selected: diversity_report
                            .as_ref()
                            .is_some_and(|r| !r.skipped),
                        cluster: labels.get(i).copied(),
                    },
                }
            })
            .collect();

        self.collector
            .record_stage("curate", start.elapsed().as_secs_f64());
        info!(
            input = images.len(),
            passed_quality = filtered.retained.len(),
            delivered = retained.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Curation run complete"
        );

        CurationOutcome {
            retained,
            filter_report: filtered.report,
            diversity_report,
        }
    }

    /// Recorded filter reports, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history
            .lock()
            .expect("report history lock poisoned")
            .entries()
            .cloned()
            .collect()
    }

    fn quality_score(&self, vector: &QualityVector) -> f64 {
        vector.restricted_to(&self.config.enabled_metrics).mean_score()
    }
}

/// Ids key the quality cache, so repeated ids share one assessment.
fn warn_on_duplicate_ids(images: &[CandidateImage]) {
    let mut seen = HashSet::with_capacity(images.len());
    for image in images {
        if !seen.insert(image.id()) {
            warn!(image = %image.id(), "Duplicate image id in batch, reusing its assessment");
        }
    }
}
