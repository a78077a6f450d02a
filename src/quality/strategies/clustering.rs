use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::diversity::distance::{euclidean_distance, standardize_columns};
use crate::pipeline::{FilterConfig, StrategyKind};
use crate::quality::QualityVector;

use super::{present_metrics, FilterStrategy, StrategyEvaluation, Verdict};

/// Upper bound on the number of clusters.
const MAX_CLUSTERS: usize = 5;

/// Number of best clusters whose members are kept.
const KEPT_CLUSTERS: usize = 3;

const MAX_ITERATIONS: usize = 100;

/// Lloyd's k-means with deterministic max-min seeding.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    seed: u64,
}

/// Cluster assignment produced by [`KMeans::fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Cluster index per input row.
    pub assignments: Vec<usize>,
    pub centroids: Array2<f64>,
    pub iterations: usize,
}

impl KMeans {
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k: k.max(1),
            max_iterations: MAX_ITERATIONS,
            seed,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Clusters the rows of `points`. `k` is capped at the number of rows.
    pub fn fit(&self, points: &Array2<f64>) -> KMeansFit {
        let n = points.nrows();
        if n == 0 {
            return KMeansFit {
                assignments: Vec::new(),
                centroids: Array2::zeros((0, points.ncols())),
                iterations: 0,
            };
        }

        let seeds = self.initial_centroids(points);
        let mut centroids = Array2::zeros((seeds.len(), points.ncols()));
        for (c, &row) in seeds.iter().enumerate() {
            centroids.row_mut(c).assign(&points.row(row));
        }

        let mut assignments = assign(points, &centroids);
        let mut iterations = 1;
        while iterations < self.max_iterations {
            update_centroids(points, &assignments, &mut centroids);
            let next = assign(points, &centroids);
            iterations += 1;
            if next == assignments {
                break;
            }
            assignments = next;
        }
        update_centroids(points, &assignments, &mut centroids);

        KMeansFit {
            assignments,
            centroids,
            iterations,
        }
    }

    /// Selects initial centroids using the maxmin strategy.
    fn initial_centroids(&self, points: &Array2<f64>) -> Vec<usize> {
        let n = points.nrows();
        let k = self.k.min(n);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let first = (0..n)
            .collect::<Vec<_>>()
            .choose(&mut rng)
            .copied()
            .unwrap_or(0);

        let mut chosen = vec![first];
        let mut min_distances: Vec<f64> = (0..n)
            .map(|j| euclidean_distance(points.row(first), points.row(j)))
            .collect();

        while chosen.len() < k {
            let mut best_idx = None;
            let mut best_dist = f64::NEG_INFINITY;
            for (j, &dist) in min_distances.iter().enumerate() {
                if !chosen.contains(&j) && dist > best_dist {
                    best_dist = dist;
                    best_idx = Some(j);
                }
            }
            let Some(next) = best_idx else { break };
            chosen.push(next);

            for (j, min_dist) in min_distances.iter_mut().enumerate() {
                *min_dist = min_dist.min(euclidean_distance(points.row(next), points.row(j)));
            }
        }

        chosen
    }
}

/// Nearest centroid per row; ties go to the lower centroid index.
fn assign(points: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    points
        .rows()
        .into_iter()
        .map(|row| nearest(row, centroids))
        .collect()
}

fn nearest(row: ArrayView1<'_, f64>, centroids: &Array2<f64>) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = euclidean_distance(row, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    best
}

/// Moves each centroid to the mean of its members. Empty clusters keep their centroid.
fn update_centroids(points: &Array2<f64>, assignments: &[usize], centroids: &mut Array2<f64>) {
    for c in 0..centroids.nrows() {
        let members: Vec<usize> = assignments
            .iter()
            .enumerate()
            .filter(|(_, a)| **a == c)
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            continue;
        }
        let mut sum = Array1::<f64>::zeros(points.ncols());
        for &i in &members {
            sum += &points.row(i);
        }
        centroids
            .row_mut(c)
            .assign(&(sum / members.len() as f64));
    }
}

/// Groups images by standardized metric profile and keeps the best clusters.
///
/// Missing metrics are zero-filled before standardization. A cluster's
/// quality is the mean of its members' standardized values; members of the
/// top three clusters are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusteringStrategy;

impl ClusteringStrategy {
    /// Cluster count for a batch of `n` images.
    pub fn cluster_count(n: usize) -> usize {
        MAX_CLUSTERS.min(n / 2).max(1)
    }
}

impl FilterStrategy for ClusteringStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Clustering
    }

    fn evaluate(&self, vectors: &[QualityVector], config: &FilterConfig) -> StrategyEvaluation {
        let n = vectors.len();
        let metrics = present_metrics(vectors, &config.enabled_metrics);

        let mut matrix = Array2::<f64>::zeros((n, metrics.len()));
        for (i, vector) in vectors.iter().enumerate() {
            for (j, &metric) in metrics.iter().enumerate() {
                matrix[[i, j]] = vector.get(metric).unwrap_or(0.0);
            }
        }
        let standardized = standardize_columns(&matrix);

        let k = Self::cluster_count(n);
        let fit = KMeans::new(k, config.seed).fit(&standardized);

        let cluster_total = fit.centroids.nrows();
        let mut quality: Vec<(usize, f64)> = (0..cluster_total)
            .filter(|c| fit.assignments.contains(c))
            .map(|c| {
                let values: Vec<f64> = fit
                    .assignments
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| **a == c)
                    .flat_map(|(i, _)| standardized.row(i).to_vec())
                    .collect();
                let proxy = if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                };
                (c, proxy)
            })
            .collect();
        quality.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let populated = quality.len();
        let kept: Vec<usize> = quality.iter().take(KEPT_CLUSTERS).map(|(c, _)| *c).collect();

        tracing::debug!(
            images = n,
            clusters = populated,
            iterations = fit.iterations,
            "Clustered batch by quality profile"
        );

        let verdicts = fit
            .assignments
            .iter()
            .map(|cluster| {
                if kept.contains(cluster) {
                    return Verdict::keep();
                }
                let (rank, proxy) = quality
                    .iter()
                    .enumerate()
                    .find(|(_, (c, _))| c == cluster)
                    .map(|(rank, (_, proxy))| (rank + 1, *proxy))
                    .unwrap_or((populated, 0.0));
                Verdict::reject(vec![format!(
                    "quality cluster ranked {} of {} (score {:.3}); only the top {} are kept",
                    rank, populated, proxy, KEPT_CLUSTERS
                )])
            })
            .collect();

        StrategyEvaluation::from_verdicts(verdicts)
    }
}
