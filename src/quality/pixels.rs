//! Low-level pixel operations shared by the metric suite and feature extraction.
//!
//! All filters operate on an `f64` intensity plane in the 0-255 range and only
//! evaluate interior pixels; border pixels of derived planes are left at zero.

use ndarray::{Array2, Array3};

/// Rec.601 luma weights.
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Converts an `H×W×C` buffer to a single intensity plane.
///
/// 3- and 4-channel images use Rec.601 luma (alpha is ignored); any other
/// channel count uses the first channel.
pub fn intensity(pixels: &Array3<u8>) -> Array2<f64> {
    let (height, width, channels) = pixels.dim();
    Array2::from_shape_fn((height, width), |(y, x)| {
        if channels >= 3 {
            LUMA_WEIGHTS
                .iter()
                .enumerate()
                .map(|(c, w)| w * pixels[[y, x, c]] as f64)
                .sum()
        } else if channels > 0 {
            pixels[[y, x, 0]] as f64
        } else {
            0.0
        }
    })
}

/// Responses of the 4-neighbour Laplacian kernel over interior pixels.
///
/// ```text
/// [ 0  1  0 ]
/// [ 1 -4  1 ]
/// [ 0  1  0 ]
/// ```
pub fn laplacian_responses(gray: &Array2<f64>) -> Vec<f64> {
    let (height, width) = gray.dim();
    if height < 3 || width < 3 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity((height - 2) * (width - 2));
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let value = gray[[y - 1, x]] + gray[[y + 1, x]] + gray[[y, x - 1]] + gray[[y, x + 1]]
                - 4.0 * gray[[y, x]];
            out.push(value);
        }
    }
    out
}

/// Horizontal and vertical Sobel derivatives at an interior pixel.
pub fn sobel_at(gray: &Array2<f64>, y: usize, x: usize) -> (f64, f64) {
    let p = |dy: isize, dx: isize| gray[[(y as isize + dy) as usize, (x as isize + dx) as usize]];
    let gx = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
    let gy = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
    (gx, gy)
}

/// Sobel gradient magnitude plane; the one-pixel border is zero.
pub fn sobel_magnitude(gray: &Array2<f64>) -> Array2<f64> {
    let (height, width) = gray.dim();
    let mut out = Array2::zeros((height, width));
    if height < 3 || width < 3 {
        return out;
    }
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let (gx, gy) = sobel_at(gray, y, x);
            out[[y, x]] = (gx * gx + gy * gy).sqrt();
        }
    }
    out
}

/// Difference between each interior pixel and its 3×3 box mean.
pub fn high_pass_responses(gray: &Array2<f64>) -> Vec<f64> {
    let (height, width) = gray.dim();
    if height < 3 || width < 3 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity((height - 2) * (width - 2));
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sum = 0.0;
            for yy in y - 1..=y + 1 {
                for xx in x - 1..=x + 1 {
                    sum += gray[[yy, xx]];
                }
            }
            out.push(gray[[y, x]] - sum / 9.0);
        }
    }
    out
}

/// Population mean and standard deviation. Returns `None` for an empty slice.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// Shannon entropy (natural log) of a count histogram.
pub fn histogram_entropy(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.ln()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_rgb_and_gray() {
        let rgb = Array3::from_elem((2, 2, 3), 100u8);
        let gray = intensity(&rgb);
        assert!((gray[[0, 0]] - 100.0).abs() < 1e-9);

        let mut single = Array3::zeros((1, 2, 1));
        single[[0, 1, 0]] = 7;
        let gray = intensity(&single);
        assert_eq!(gray[[0, 1]], 7.0);
    }

    #[test]
    fn test_laplacian_of_flat_plane_is_zero() {
        let gray = Array2::from_elem((5, 5), 42.0);
        let responses = laplacian_responses(&gray);
        assert_eq!(responses.len(), 9);
        assert!(responses.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_sobel_detects_vertical_edge() {
        let gray = Array2::from_shape_fn((3, 3), |(_, x)| if x == 2 { 255.0 } else { 0.0 });
        let (gx, gy) = sobel_at(&gray, 1, 1);
        assert_eq!(gx, 1020.0);
        assert_eq!(gy, 0.0);
        assert_eq!(sobel_magnitude(&gray)[[1, 1]], 1020.0);
    }

    #[test]
    fn test_small_planes_yield_nothing() {
        let gray = Array2::from_elem((2, 10), 1.0);
        assert!(laplacian_responses(&gray).is_empty());
        assert!(high_pass_responses(&gray).is_empty());
    }

    #[test]
    fn test_histogram_entropy() {
        assert_eq!(histogram_entropy(&[0, 0]), 0.0);
        assert_eq!(histogram_entropy(&[5, 0, 0]), 0.0);
        let uniform = histogram_entropy(&[1, 1, 1, 1]);
        assert!((uniform - 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_mean_std() {
        assert!(mean_std(&[]).is_none());
        let (mean, std) = mean_std(&[1.0, 3.0]).expect("non-empty");
        assert_eq!(mean, 2.0);
        assert_eq!(std, 1.0);
    }
}
