//! Batch quality assessment.
//!
//! Fans each image out to a bounded pool of workers, computes pixel metrics
//! on the blocking thread pool, calls the neural scorer under a timeout, and
//! joins the whole batch before returning. Results go through the session's
//! [`QualityCache`] so every image is assessed at most once.
//!
//! Cached vectors always hold the full pixel suite, plus the neural scores
//! when a scorer is configured, so a cache shared between assessors with
//! different metric sets never serves a vector missing a metric. Callers
//! restrict vectors to their enabled metrics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::candidate::CandidateImage;
use crate::error::ScorerError;
use crate::metrics::MetricsCollector;

use super::cache::QualityCache;
use super::metrics::MetricSuite;
use super::scorer::{score_with_timeout, NeuralScorer, NoopScorer};
use super::vector::{Metric, QualityVector};

/// Default number of images assessed concurrently.
const DEFAULT_CONCURRENCY_LIMIT: usize = 4;

/// Default timeout for a single neural scorer call.
const DEFAULT_SCORER_TIMEOUT: Duration = Duration::from_secs(5);

/// Computes quality vectors for candidate images.
#[derive(Clone)]
pub struct QualityAssessor {
    suite: MetricSuite,
    enabled: Vec<Metric>,
    scorer: Arc<dyn NeuralScorer>,
    cache: Arc<QualityCache>,
    concurrency_limit: usize,
    scorer_timeout: Duration,
    collector: MetricsCollector,
}

impl std::fmt::Debug for QualityAssessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityAssessor")
            .field("enabled", &self.enabled)
            .field("scorer", &self.scorer.name())
            .field("concurrency_limit", &self.concurrency_limit)
            .field("scorer_timeout", &self.scorer_timeout)
            .finish()
    }
}

impl QualityAssessor {
    /// Creates an assessor reporting on the given metrics, with no neural scorer.
    pub fn new(enabled: Vec<Metric>, cache: Arc<QualityCache>) -> Self {
        Self {
            suite: MetricSuite::default(),
            enabled,
            scorer: Arc::new(NoopScorer),
            cache,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            scorer_timeout: DEFAULT_SCORER_TIMEOUT,
            collector: MetricsCollector::new(),
        }
    }

    /// Sets the neural scorer.
    pub fn with_scorer(mut self, scorer: Arc<dyn NeuralScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Replaces the session cache, e.g. to share one cache across assessors.
    pub fn with_cache(mut self, cache: Arc<QualityCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Sets how many images are assessed at once. Values below 1 become 1.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    /// Sets the timeout applied to each scorer call.
    pub fn with_scorer_timeout(mut self, timeout: Duration) -> Self {
        self.scorer_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &Arc<QualityCache> {
        &self.cache
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Returns the quality vector for one image, computing it on a cache miss.
    pub async fn assess(&self, image: &CandidateImage) -> QualityVector {
        self.cache
            .get_or_compute(image.id(), || self.compute(image))
            .await
    }

    /// Assesses a whole batch and returns vectors in input order.
    ///
    /// Returns only after every image has been assessed.
    pub async fn assess_batch(&self, images: &[CandidateImage]) -> Vec<QualityVector> {
        if images.is_empty() {
            return Vec::new();
        }

        let start = Instant::now();
        let before = self.cache.stats();
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));

        let futures: Vec<_> = images
            .iter()
            .map(|image| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => Some(permit),
                        Err(e) => {
                            warn!(error = %e, "Assessment semaphore closed, continuing unbounded");
                            None
                        }
                    };
                    self.assess(image).await
                }
            })
            .collect();

        let vectors = futures::future::join_all(futures).await;

        let after = self.cache.stats();
        self.collector.record_cache_lookups(
            after.hits.saturating_sub(before.hits),
            after.misses.saturating_sub(before.misses),
        );
        info!(
            images = images.len(),
            concurrency = self.concurrency_limit,
            cache_misses = after.misses.saturating_sub(before.misses),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch assessment complete"
        );

        vectors
    }

    async fn compute(&self, image: &CandidateImage) -> QualityVector {
        let start = Instant::now();
        let suite = self.suite.clone();
        let pixels = image.shared_pixels();

        let mut vector = match tokio::task::spawn_blocking(move || suite.compute(&pixels)).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(image = %image.id(), error = %e, "Pixel metric worker failed");
                QualityVector::new()
            }
        };

        if self.scorer.is_enabled() {
            match score_with_timeout(self.scorer.as_ref(), image, self.scorer_timeout).await {
                Ok(scores) => {
                    scores.merge_into(&mut vector, &Metric::NEURAL);
                    self.collector.record_scorer_call("success");
                }
                Err(ScorerError::Timeout(after)) => {
                    warn!(image = %image.id(), scorer = self.scorer.name(), timeout = ?after, "Neural scorer timed out, omitting its metrics");
                    self.collector.record_scorer_call("timeout");
                }
                Err(e) => {
                    warn!(image = %image.id(), scorer = self.scorer.name(), error = %e, "Neural scorer failed, omitting its metrics");
                    self.collector.record_scorer_call("error");
                }
            }
        }

        let omitted = self
            .enabled
            .iter()
            .filter(|m| !vector.contains(**m))
            .count();
        self.collector
            .record_assessment(start.elapsed().as_secs_f64(), omitted);
        debug!(
            image = %image.id(),
            present = vector.len(),
            omitted,
            "Assessed image"
        );

        vector
    }
}
