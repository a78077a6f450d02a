//! Pixel-domain quality metrics.
//!
//! Every metric is a pure function of the pixel buffer returning a score in
//! `[0, 1]`. Metrics fail independently: a failure omits that metric from the
//! image's [`QualityVector`] and never affects the others.

use ndarray::{Array2, Array3};
use tracing::debug;

use crate::error::MetricError;

use super::pixels::{
    high_pass_responses, histogram_entropy, intensity, laplacian_responses, mean_std,
    sobel_magnitude,
};
use super::vector::{Metric, QualityVector};

/// Laplacian variance that maps to a sharpness of 1.0.
const SHARPNESS_SCALE: f64 = 1000.0;

/// Half of the 8-bit intensity range.
const HALF_INTENSITY_RANGE: f64 = 127.5;

/// Largest single-axis Sobel response on 8-bit data.
const SOBEL_NORMALIZER: f64 = 1020.0;

/// Sobel magnitude above which a pixel counts as an edge.
const EDGE_THRESHOLD: f64 = 128.0;

/// Edge density that maps to an artifact level of 1.0 is `1 / ARTIFACT_SCALE`.
const ARTIFACT_SCALE: f64 = 10.0;

/// Multiplier applied to the rule-of-thirds energy share.
const COMPOSITION_SCALE: f64 = 2.0;

/// Band half-width around each thirds line, as a fraction of the min dimension.
const THIRDS_BAND_DIVISOR: usize = 12;

/// Minimum side length required by the 3×3 filters.
const MIN_FILTER_SIDE: usize = 3;

/// Computes the enabled pixel metrics for an image.
#[derive(Debug, Clone)]
pub struct MetricSuite {
    enabled: Vec<Metric>,
}

impl Default for MetricSuite {
    fn default() -> Self {
        Self::new(Metric::PIXEL.to_vec())
    }
}

impl MetricSuite {
    /// Creates a suite that computes the given metrics.
    ///
    /// Neural metrics in the list are ignored; they come from the scorer.
    pub fn new(enabled: Vec<Metric>) -> Self {
        let enabled = enabled.into_iter().filter(|m| !m.is_neural()).collect();
        Self { enabled }
    }

    pub fn enabled(&self) -> &[Metric] {
        &self.enabled
    }

    /// Computes every enabled metric, omitting the ones that fail.
    pub fn compute(&self, pixels: &Array3<u8>) -> QualityVector {
        let gray = intensity(pixels);
        let mut vector = QualityVector::new();

        for &metric in &self.enabled {
            match compute_metric(metric, pixels, &gray) {
                Ok(score) => vector.insert(metric, score),
                Err(e) => debug!(metric = %metric, error = %e, "Metric omitted"),
            }
        }

        vector
    }
}

/// Computes a single pixel metric given the image and its intensity plane.
pub fn compute_metric(
    metric: Metric,
    pixels: &Array3<u8>,
    gray: &Array2<f64>,
) -> Result<f64, MetricError> {
    match metric {
        Metric::Sharpness => sharpness(gray),
        Metric::Contrast => contrast(gray),
        Metric::Brightness => brightness(gray),
        Metric::Saturation => saturation(pixels),
        Metric::NoiseLevel => noise_level(gray),
        Metric::BlurLevel => blur_level(gray),
        Metric::ArtifactLevel => artifact_level(gray),
        Metric::ResolutionQuality => resolution_quality(pixels.dim().0, pixels.dim().1),
        Metric::ColorHarmony => color_harmony(pixels),
        Metric::Composition => composition(gray),
        Metric::Aesthetic | Metric::Technical | Metric::Naturalness => {
            Err(MetricError::Degenerate {
                metric,
                reason: "scored by the neural scorer, not from pixels".to_string(),
            })
        }
    }
}

fn require_filter_size(metric: Metric, gray: &Array2<f64>) -> Result<(), MetricError> {
    let (height, width) = gray.dim();
    if height < MIN_FILTER_SIDE || width < MIN_FILTER_SIDE {
        return Err(MetricError::TooSmall {
            metric,
            required: MIN_FILTER_SIDE,
            height,
            width,
        });
    }
    Ok(())
}

fn require_pixels(metric: Metric, gray: &Array2<f64>) -> Result<(), MetricError> {
    if gray.is_empty() {
        return Err(MetricError::Degenerate {
            metric,
            reason: "image has no pixels".to_string(),
        });
    }
    Ok(())
}

/// Variance of the Laplacian response, scaled to `[0, 1]`.
pub fn sharpness(gray: &Array2<f64>) -> Result<f64, MetricError> {
    require_filter_size(Metric::Sharpness, gray)?;
    let responses = laplacian_responses(gray);
    let (_, std) = mean_std(&responses).unwrap_or((0.0, 0.0));
    Ok((std * std / SHARPNESS_SCALE).clamp(0.0, 1.0))
}

/// RMS contrast normalized by half the intensity range.
pub fn contrast(gray: &Array2<f64>) -> Result<f64, MetricError> {
    require_pixels(Metric::Contrast, gray)?;
    let values: Vec<f64> = gray.iter().copied().collect();
    let (_, std) = mean_std(&values).unwrap_or((0.0, 0.0));
    Ok((std / HALF_INTENSITY_RANGE).clamp(0.0, 1.0))
}

/// Mean intensity in `[0, 1]`.
pub fn brightness(gray: &Array2<f64>) -> Result<f64, MetricError> {
    require_pixels(Metric::Brightness, gray)?;
    let mean = gray.iter().sum::<f64>() / gray.len() as f64;
    Ok((mean / 255.0).clamp(0.0, 1.0))
}

/// Mean HSV saturation. Needs at least three colour channels.
pub fn saturation(pixels: &Array3<u8>) -> Result<f64, MetricError> {
    let (height, width, channels) = pixels.dim();
    if channels < 3 {
        return Err(MetricError::UnsupportedChannels {
            metric: Metric::Saturation,
            required: 3,
            channels,
        });
    }
    if height == 0 || width == 0 {
        return Err(MetricError::Degenerate {
            metric: Metric::Saturation,
            reason: "image has no pixels".to_string(),
        });
    }

    let mut total = 0.0;
    for y in 0..height {
        for x in 0..width {
            let r = pixels[[y, x, 0]];
            let g = pixels[[y, x, 1]];
            let b = pixels[[y, x, 2]];
            let max = r.max(g).max(b) as f64;
            let min = r.min(g).min(b) as f64;
            if max > 0.0 {
                total += (max - min) / max;
            }
        }
    }
    Ok((total / (height * width) as f64).clamp(0.0, 1.0))
}

/// Standard deviation of the high-pass residual on unit intensity.
pub fn noise_level(gray: &Array2<f64>) -> Result<f64, MetricError> {
    require_filter_size(Metric::NoiseLevel, gray)?;
    let residual: Vec<f64> = high_pass_responses(gray)
        .into_iter()
        .map(|v| v / 255.0)
        .collect();
    let (_, std) = mean_std(&residual).unwrap_or((0.0, 0.0));
    Ok(std.clamp(0.0, 1.0))
}

/// One minus the normalized mean Sobel magnitude.
pub fn blur_level(gray: &Array2<f64>) -> Result<f64, MetricError> {
    require_filter_size(Metric::BlurLevel, gray)?;
    let (height, width) = gray.dim();
    let magnitude = sobel_magnitude(gray);
    let interior = ((height - 2) * (width - 2)) as f64;
    let mean = magnitude.iter().sum::<f64>() / interior;
    Ok(1.0 - (mean / SOBEL_NORMALIZER).clamp(0.0, 1.0))
}

/// Scaled share of pixels classified as edges.
pub fn artifact_level(gray: &Array2<f64>) -> Result<f64, MetricError> {
    require_filter_size(Metric::ArtifactLevel, gray)?;
    let magnitude = sobel_magnitude(gray);
    let edges = magnitude.iter().filter(|&&m| m > EDGE_THRESHOLD).count();
    let ratio = edges as f64 / gray.len() as f64;
    Ok((ratio * ARTIFACT_SCALE).clamp(0.0, 1.0))
}

/// Step function over the smaller image dimension.
pub fn resolution_quality(height: usize, width: usize) -> Result<f64, MetricError> {
    let min_dim = height.min(width);
    if min_dim == 0 {
        return Err(MetricError::Degenerate {
            metric: Metric::ResolutionQuality,
            reason: "image has a zero dimension".to_string(),
        });
    }
    Ok(match min_dim {
        d if d >= 1024 => 1.0,
        d if d >= 512 => 0.8,
        d if d >= 256 => 0.6,
        _ => 0.4,
    })
}

/// One minus the mean normalized per-channel histogram entropy.
pub fn color_harmony(pixels: &Array3<u8>) -> Result<f64, MetricError> {
    let (height, width, channels) = pixels.dim();
    if height == 0 || width == 0 || channels == 0 {
        return Err(MetricError::Degenerate {
            metric: Metric::ColorHarmony,
            reason: "image has no pixels".to_string(),
        });
    }
    // Alpha carries no palette information.
    let colour_channels = if channels == 4 { 3 } else { channels };
    let max_entropy = 256f64.ln();

    let mut entropy_sum = 0.0;
    for c in 0..colour_channels {
        let mut counts = [0u64; 256];
        for y in 0..height {
            for x in 0..width {
                counts[pixels[[y, x, c]] as usize] += 1;
            }
        }
        entropy_sum += histogram_entropy(&counts) / max_entropy;
    }
    let mean_entropy = entropy_sum / colour_channels as f64;
    Ok((1.0 - mean_entropy).clamp(0.0, 1.0))
}

/// Share of gradient energy lying near the rule-of-thirds lines.
pub fn composition(gray: &Array2<f64>) -> Result<f64, MetricError> {
    require_filter_size(Metric::Composition, gray)?;
    let (height, width) = gray.dim();
    let magnitude = sobel_magnitude(gray);
    let total: f64 = magnitude.iter().sum();
    if total <= f64::EPSILON {
        return Err(MetricError::Degenerate {
            metric: Metric::Composition,
            reason: "image has no gradient energy".to_string(),
        });
    }

    let band = (height.min(width) / THIRDS_BAND_DIVISOR).max(1) as f64;
    let columns = [width as f64 / 3.0, 2.0 * width as f64 / 3.0];
    let rows = [height as f64 / 3.0, 2.0 * height as f64 / 3.0];

    let mut near = 0.0;
    for ((y, x), &m) in magnitude.indexed_iter() {
        let on_column = columns.iter().any(|c| (x as f64 - c).abs() <= band);
        let on_row = rows.iter().any(|r| (y as f64 - r).abs() <= band);
        if on_column || on_row {
            near += m;
        }
    }

    Ok((near / total * COMPOSITION_SCALE).clamp(0.0, 1.0))
}
