//! External neural scorer capability.
//!
//! The model producing aesthetic, technical, and naturalness scores lives
//! outside this crate. It is injected as a [`NeuralScorer`] and every call is
//! bounded by a timeout; failures only omit the three neural metrics.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::candidate::CandidateImage;
use crate::error::ScorerError;

use super::vector::{Metric, QualityVector};

/// Scores returned by a neural scorer, each nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeuralScores {
    pub aesthetic: f64,
    pub technical: f64,
    pub naturalness: f64,
}

impl NeuralScores {
    pub fn new(aesthetic: f64, technical: f64, naturalness: f64) -> Self {
        Self {
            aesthetic,
            technical,
            naturalness,
        }
    }

    /// Writes the scores into a quality vector.
    ///
    /// Scores are clamped to `[0, 1]`; non-finite values are dropped.
    pub fn merge_into(&self, vector: &mut QualityVector, enabled: &[Metric]) {
        let pairs = [
            (Metric::Aesthetic, self.aesthetic),
            (Metric::Technical, self.technical),
            (Metric::Naturalness, self.naturalness),
        ];
        for (metric, score) in pairs {
            if enabled.contains(&metric) && score.is_finite() {
                vector.insert(metric, score.clamp(0.0, 1.0));
            }
        }
    }
}

/// Black-box model that scores a single image.
#[async_trait]
pub trait NeuralScorer: Send + Sync {
    /// Scores one image.
    async fn score(&self, image: &CandidateImage) -> Result<NeuralScores, ScorerError>;

    /// Whether the scorer should be called at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Name used in logs.
    fn name(&self) -> &str {
        "neural"
    }
}

/// Scorer used when no model is configured; it is never called.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScorer;

#[async_trait]
impl NeuralScorer for NoopScorer {
    async fn score(&self, _image: &CandidateImage) -> Result<NeuralScores, ScorerError> {
        Err(ScorerError::Unavailable("no neural scorer configured".to_string()))
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Scorer that returns the same scores for every image.
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer {
    scores: NeuralScores,
}

impl FixedScorer {
    pub fn new(scores: NeuralScores) -> Self {
        Self { scores }
    }
}

#[async_trait]
impl NeuralScorer for FixedScorer {
    async fn score(&self, _image: &CandidateImage) -> Result<NeuralScores, ScorerError> {
        Ok(self.scores)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Calls the scorer once, converting an elapsed timeout into [`ScorerError::Timeout`].
pub async fn score_with_timeout(
    scorer: &dyn NeuralScorer,
    image: &CandidateImage,
    timeout: Duration,
) -> Result<NeuralScores, ScorerError> {
    match tokio::time::timeout(timeout, scorer.score(image)).await {
        Ok(result) => result,
        Err(_) => Err(ScorerError::Timeout(timeout)),
    }
}
