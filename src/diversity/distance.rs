//! Vector geometry shared by the clustering-based components.

use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Computes Euclidean distance between two vectors.
///
/// # Panics
///
/// Panics if vectors have different lengths.
pub fn euclidean_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    assert_eq!(
        a.len(),
        b.len(),
        "Vectors must have the same length for Euclidean distance"
    );

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Computes the symmetric pairwise distance matrix between the rows of `points`.
pub fn pairwise_euclidean_distance(points: &Array2<f64>) -> Array2<f64> {
    let n = points.nrows();
    let mut distance_matrix = Array2::zeros((n, n));

    for i in 0..n {
        for j in (i + 1)..n {
            let dist = euclidean_distance(points.row(i), points.row(j));
            distance_matrix[[i, j]] = dist;
            distance_matrix[[j, i]] = dist;
        }
    }

    distance_matrix
}

/// Standardizes each column to zero mean and unit population variance.
///
/// Columns with zero variance become all zeros.
pub fn standardize_columns(points: &Array2<f64>) -> Array2<f64> {
    let mut standardized = points.clone();
    if points.nrows() == 0 {
        return standardized;
    }

    for mut column in standardized.axis_iter_mut(Axis(1)) {
        let n = column.len() as f64;
        let mean = column.sum() / n;
        let std = (column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        if std > 1e-12 {
            column.mapv_inplace(|v| (v - mean) / std);
        } else {
            column.fill(0.0);
        }
    }

    standardized
}

/// Normalizes a vector to unit length (L2 norm). Near-zero vectors are left unchanged.
pub fn l2_normalize(v: &mut Array1<f64>) {
    let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 1e-10 {
        v.mapv_inplace(|x| x / norm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_euclidean_distance() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert!((euclidean_distance(a.view(), b.view()) - 5.0).abs() < 1e-12);
        assert_eq!(euclidean_distance(a.view(), a.view()), 0.0);
    }

    #[test]
    fn test_pairwise_is_symmetric() {
        let points = array![[0.0, 0.0], [1.0, 0.0], [0.0, 2.0]];
        let d = pairwise_euclidean_distance(&points);
        assert_eq!(d.dim(), (3, 3));
        assert_eq!(d[[0, 1]], 1.0);
        assert_eq!(d[[2, 0]], 2.0);
        assert_eq!(d[[1, 2]], d[[2, 1]]);
        assert_eq!(d[[1, 1]], 0.0);
    }

    #[test]
    fn test_standardize_columns() {
        let points = array![[1.0, 5.0], [3.0, 5.0]];
        let z = standardize_columns(&points);
        assert!((z[[0, 0]] + 1.0).abs() < 1e-12);
        assert!((z[[1, 0]] - 1.0).abs() < 1e-12);
        assert_eq!(z[[0, 1]], 0.0);
        assert_eq!(z[[1, 1]], 0.0);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = array![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[1] - 0.8).abs() < 1e-12);

        let mut zero = array![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, array![0.0, 0.0]);
    }
}
