//! Appearance features for redundancy detection.
//!
//! Each image becomes a fixed-length vector built from the enabled
//! [`DiversityFeature`] groups, then L2-normalized:
//!
//! - **Color histogram**: joint histogram with four levels per channel (64 bins).
//!   Images with fewer than three channels use their first channel for all three,
//!   so gray pixels land on the diagonal bins.
//! - **Texture**: rotation-invariant uniform LBP histogram (10 bins) followed by
//!   the mean absolute response of derivative filters at 0, 45, 90 and 135 degrees.
//! - **Spatial moments**: intensity centroid (x, y) and the central moments
//!   mu20, mu02, mu11 in unit image coordinates.

use ndarray::{Array1, Array2, Array3};

use crate::candidate::CandidateImage;
use crate::pipeline::DiversityFeature;
use crate::quality::pixels::intensity;

use super::distance::l2_normalize;

const COLOR_LEVELS: usize = 4;
const COLOR_BINS: usize = COLOR_LEVELS * COLOR_LEVELS * COLOR_LEVELS;
const LBP_BINS: usize = 10;
const ORIENTATIONS: usize = 4;
const MOMENTS: usize = 5;

/// Clockwise 8-neighbourhood offsets starting at the top-left pixel.
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// Converts images into diversity feature vectors.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    features: Vec<DiversityFeature>,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(DiversityFeature::ALL.to_vec())
    }
}

impl FeatureExtractor {
    /// Creates an extractor for the given groups. Duplicates are ignored and
    /// groups are always laid out in canonical order.
    pub fn new(mut features: Vec<DiversityFeature>) -> Self {
        features.sort();
        features.dedup();
        Self { features }
    }

    pub fn features(&self) -> &[DiversityFeature] {
        &self.features
    }

    /// Length of every vector this extractor produces.
    pub fn dimension(&self) -> usize {
        self.features.iter().map(|f| group_dimension(*f)).sum()
    }

    /// Computes the unit-normalized feature vector of one image.
    pub fn extract(&self, pixels: &Array3<u8>) -> Array1<f64> {
        let gray = intensity(pixels);
        let mut values = Vec::with_capacity(self.dimension());
        for feature in &self.features {
            match feature {
                DiversityFeature::ColorHistogram => values.extend(color_histogram(pixels)),
                DiversityFeature::Texture => {
                    values.extend(lbp_histogram(&gray));
                    values.extend(oriented_responses(&gray));
                }
                DiversityFeature::SpatialMoments => values.extend(spatial_moments(&gray)),
            }
        }

        let mut vector = Array1::from(values);
        l2_normalize(&mut vector);
        vector
    }

    /// Feature matrix with one row per image, in input order.
    pub fn extract_batch(&self, images: &[CandidateImage]) -> Array2<f64> {
        let mut matrix = Array2::zeros((images.len(), self.dimension()));
        for (i, image) in images.iter().enumerate() {
            matrix.row_mut(i).assign(&self.extract(image.pixels()));
        }
        matrix
    }
}

fn group_dimension(feature: DiversityFeature) -> usize {
    match feature {
        DiversityFeature::ColorHistogram => COLOR_BINS,
        DiversityFeature::Texture => LBP_BINS + ORIENTATIONS,
        DiversityFeature::SpatialMoments => MOMENTS,
    }
}

/// Joint color histogram with four levels per channel, as pixel fractions.
pub fn color_histogram(pixels: &Array3<u8>) -> Vec<f64> {
    let (height, width, channels) = pixels.dim();
    let mut bins = vec![0.0; COLOR_BINS];
    let total = height * width;
    if total == 0 || channels == 0 {
        return bins;
    }

    let level = |v: u8| (v as usize) * COLOR_LEVELS / 256;
    for y in 0..height {
        for x in 0..width {
            let (r, g, b) = if channels >= 3 {
                (pixels[[y, x, 0]], pixels[[y, x, 1]], pixels[[y, x, 2]])
            } else {
                let v = pixels[[y, x, 0]];
                (v, v, v)
            };
            let bin = level(r) * COLOR_LEVELS * COLOR_LEVELS + level(g) * COLOR_LEVELS + level(b);
            bins[bin] += 1.0;
        }
    }

    bins.iter_mut().for_each(|b| *b /= total as f64);
    bins
}

/// Rotation-invariant uniform LBP histogram over interior pixels.
///
/// Uniform patterns (at most two bit transitions) map to their count of set
/// bits (0..=8); everything else shares bin 9.
pub fn lbp_histogram(gray: &Array2<f64>) -> Vec<f64> {
    let (height, width) = gray.dim();
    let mut bins = vec![0.0; LBP_BINS];
    if height < 3 || width < 3 {
        return bins;
    }

    let mut total = 0.0;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = gray[[y, x]];
            let bits: Vec<bool> = NEIGHBOURS
                .iter()
                .map(|&(dy, dx)| {
                    let ny = (y as isize + dy) as usize;
                    let nx = (x as isize + dx) as usize;
                    gray[[ny, nx]] >= center
                })
                .collect();

            let transitions = (0..bits.len())
                .filter(|&i| bits[i] != bits[(i + 1) % bits.len()])
                .count();
            let label = if transitions <= 2 {
                bits.iter().filter(|&&b| b).count()
            } else {
                LBP_BINS - 1
            };
            bins[label] += 1.0;
            total += 1.0;
        }
    }

    bins.iter_mut().for_each(|b| *b /= total);
    bins
}

/// Mean absolute central differences at 0, 45, 90 and 135 degrees, scaled to [0, 1].
pub fn oriented_responses(gray: &Array2<f64>) -> Vec<f64> {
    let (height, width) = gray.dim();
    let mut sums = [0.0; ORIENTATIONS];
    if height < 3 || width < 3 {
        return sums.to_vec();
    }

    let mut count = 0.0;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            sums[0] += (gray[[y, x + 1]] - gray[[y, x - 1]]).abs();
            sums[1] += (gray[[y - 1, x + 1]] - gray[[y + 1, x - 1]]).abs();
            sums[2] += (gray[[y + 1, x]] - gray[[y - 1, x]]).abs();
            sums[3] += (gray[[y - 1, x - 1]] - gray[[y + 1, x + 1]]).abs();
            count += 1.0;
        }
    }

    sums.iter().map(|s| s / count / 255.0).collect()
}

/// Intensity centroid and second-order central moments in unit coordinates.
///
/// A black image has no mass; it reports the image center and zero spread.
pub fn spatial_moments(gray: &Array2<f64>) -> Vec<f64> {
    let (height, width) = gray.dim();
    let mass: f64 = gray.sum();
    if height == 0 || width == 0 || mass <= 0.0 {
        return vec![0.5, 0.5, 0.0, 0.0, 0.0];
    }

    let unit_x = |x: usize| (x as f64 + 0.5) / width as f64;
    let unit_y = |y: usize| (y as f64 + 0.5) / height as f64;

    let mut cx = 0.0;
    let mut cy = 0.0;
    for ((y, x), &v) in gray.indexed_iter() {
        cx += unit_x(x) * v;
        cy += unit_y(y) * v;
    }
    cx /= mass;
    cy /= mass;

    let (mut mu20, mut mu02, mut mu11) = (0.0, 0.0, 0.0);
    for ((y, x), &v) in gray.indexed_iter() {
        let dx = unit_x(x) - cx;
        let dy = unit_y(y) - cy;
        mu20 += dx * dx * v;
        mu02 += dy * dy * v;
        mu11 += dx * dy * v;
    }

    vec![cx, cy, mu20 / mass, mu02 / mass, mu11 / mass]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(h: usize, w: usize, c: usize, value: u8) -> Array3<u8> {
        Array3::from_elem((h, w, c), value)
    }

    #[test]
    fn test_dimension_matches_groups() {
        assert_eq!(FeatureExtractor::default().dimension(), 64 + 14 + 5);
        let texture_only = FeatureExtractor::new(vec![DiversityFeature::Texture]);
        assert_eq!(texture_only.dimension(), 14);
        assert_eq!(texture_only.extract(&flat(8, 8, 3, 10)).len(), 14);
    }

    #[test]
    fn test_vectors_are_unit_length() {
        let extractor = FeatureExtractor::default();
        let v = extractor.extract(&flat(8, 8, 3, 200));
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_color_histogram_bins() {
        let mut pixels = flat(2, 2, 3, 0);
        pixels[[0, 0, 0]] = 255;
        let bins = color_histogram(&pixels);
        assert_eq!(bins.iter().sum::<f64>(), 1.0);
        assert_eq!(bins[0], 0.75);
        assert_eq!(bins[3 * 16], 0.25);

        let gray = color_histogram(&flat(2, 2, 1, 255));
        assert_eq!(gray[COLOR_BINS - 1], 1.0);
    }

    #[test]
    fn test_lbp_flat_image_is_all_ones_pattern() {
        let gray = Array2::from_elem((5, 5), 100.0);
        let bins = lbp_histogram(&gray);
        assert_eq!(bins[8], 1.0);
        assert_eq!(lbp_histogram(&Array2::zeros((2, 2))), vec![0.0; LBP_BINS]);
    }

    #[test]
    fn test_oriented_responses_follow_edges() {
        // Vertical edge: intensity changes along x only.
        let gray = Array2::from_shape_fn((5, 5), |(_, x)| if x < 2 { 0.0 } else { 255.0 });
        let responses = oriented_responses(&gray);
        assert!(responses[0] > 0.0);
        assert_eq!(responses[2], 0.0);
    }

    #[test]
    fn test_spatial_moments_centroid() {
        let mut gray = Array2::zeros((4, 4));
        gray[[0, 3]] = 255.0;
        let moments = spatial_moments(&gray);
        assert!((moments[0] - 0.875).abs() < 1e-12);
        assert!((moments[1] - 0.125).abs() < 1e-12);
        assert_eq!(moments[2], 0.0);

        assert_eq!(spatial_moments(&Array2::zeros((3, 3))), vec![0.5, 0.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_identical_images_have_identical_features() {
        let extractor = FeatureExtractor::default();
        let image = Array3::from_shape_fn((6, 6, 3), |(y, x, c)| ((y * 40 + x * 7 + c * 3) % 256) as u8);
        assert_eq!(extractor.extract(&image), extractor.extract(&image.clone()));
    }
}
