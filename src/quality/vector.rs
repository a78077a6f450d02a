//! Metric names and per-image quality vectors.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A named quality signal.
///
/// The first ten are computed from pixels by the metric suite; the last three
/// come from the external neural scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Sharpness,
    Contrast,
    Brightness,
    Saturation,
    NoiseLevel,
    BlurLevel,
    ArtifactLevel,
    ResolutionQuality,
    ColorHarmony,
    Composition,
    Aesthetic,
    Technical,
    Naturalness,
}

impl Metric {
    /// Metrics computed directly from pixel data.
    pub const PIXEL: [Metric; 10] = [
        Metric::Sharpness,
        Metric::Contrast,
        Metric::Brightness,
        Metric::Saturation,
        Metric::NoiseLevel,
        Metric::BlurLevel,
        Metric::ArtifactLevel,
        Metric::ResolutionQuality,
        Metric::ColorHarmony,
        Metric::Composition,
    ];

    /// Metrics supplied by the neural scorer.
    pub const NEURAL: [Metric; 3] = [Metric::Aesthetic, Metric::Technical, Metric::Naturalness];

    /// Every known metric, in canonical order.
    pub fn all() -> Vec<Metric> {
        Self::PIXEL.iter().chain(Self::NEURAL.iter()).copied().collect()
    }

    pub fn is_neural(&self) -> bool {
        Self::NEURAL.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Sharpness => "sharpness",
            Metric::Contrast => "contrast",
            Metric::Brightness => "brightness",
            Metric::Saturation => "saturation",
            Metric::NoiseLevel => "noise_level",
            Metric::BlurLevel => "blur_level",
            Metric::ArtifactLevel => "artifact_level",
            Metric::ResolutionQuality => "resolution_quality",
            Metric::ColorHarmony => "color_harmony",
            Metric::Composition => "composition",
            Metric::Aesthetic => "aesthetic",
            Metric::Technical => "technical",
            Metric::Naturalness => "naturalness",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Metric::all()
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownMetric(s.to_string()))
    }
}

/// Sparse mapping of metric → score for one image.
///
/// Immutable once assessment finishes; a metric is absent when it could not
/// be computed for the image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityVector {
    scores: BTreeMap<Metric, f64>,
}

impl QualityVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, metric: Metric, score: f64) {
        self.scores.insert(metric, score);
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.scores.get(&metric).copied()
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.scores.contains_key(&metric)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.scores.iter().map(|(m, s)| (*m, *s))
    }

    /// Returns a copy holding only the given metrics.
    pub fn restricted_to(&self, metrics: &[Metric]) -> QualityVector {
        let scores = self
            .scores
            .iter()
            .filter(|(m, _)| metrics.contains(m))
            .map(|(m, s)| (*m, *s))
            .collect();
        QualityVector { scores }
    }

    /// Mean of the present scores, or 0.0 for an empty vector.
    pub fn mean_score(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.values().sum::<f64>() / self.scores.len() as f64
    }
}

impl FromIterator<(Metric, f64)> for QualityVector {
    fn from_iter<I: IntoIterator<Item = (Metric, f64)>>(iter: I) -> Self {
        QualityVector {
            scores: iter.into_iter().collect(),
        }
    }
}
