//! Density-based clustering (DBSCAN) over feature rows.

use std::collections::VecDeque;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::distance::pairwise_euclidean_distance;

/// Cluster membership of one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterLabel {
    /// Not density-reachable from any core point.
    Noise,
    /// Member of the dense cluster with this index.
    Cluster(usize),
}

impl ClusterLabel {
    pub fn cluster(&self) -> Option<usize> {
        match self {
            ClusterLabel::Cluster(id) => Some(*id),
            ClusterLabel::Noise => None,
        }
    }

    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }
}

/// DBSCAN with a fixed radius and minimum neighbourhood size.
///
/// A point's neighbourhood includes the point itself, so with
/// `min_samples = 2` any two points within `eps` form a cluster.
#[derive(Debug, Clone, Copy)]
pub struct Dbscan {
    eps: f64,
    min_samples: usize,
}

impl Dbscan {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self {
            eps,
            min_samples: min_samples.max(1),
        }
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Labels every row of `points`. Cluster indices are dense and assigned
    /// in order of each cluster's lowest-index core point.
    pub fn fit(&self, points: &Array2<f64>) -> Vec<ClusterLabel> {
        let n = points.nrows();
        let distances = pairwise_euclidean_distance(points);
        let neighbours: Vec<Vec<usize>> = (0..n)
            .map(|i| (0..n).filter(|&j| distances[[i, j]] <= self.eps).collect())
            .collect();

        let mut labels: Vec<Option<ClusterLabel>> = vec![None; n];
        let mut next_cluster = 0;

        for start in 0..n {
            if labels[start].is_some() {
                continue;
            }
            if neighbours[start].len() < self.min_samples {
                labels[start] = Some(ClusterLabel::Noise);
                continue;
            }

            let cluster = ClusterLabel::Cluster(next_cluster);
            next_cluster += 1;
            labels[start] = Some(cluster);

            let mut queue: VecDeque<usize> = neighbours[start].iter().copied().collect();
            while let Some(point) = queue.pop_front() {
                match labels[point] {
                    // Border point previously marked as noise joins the cluster.
                    Some(ClusterLabel::Noise) => labels[point] = Some(cluster),
                    Some(ClusterLabel::Cluster(_)) => {}
                    None => {
                        labels[point] = Some(cluster);
                        if neighbours[point].len() >= self.min_samples {
                            queue.extend(neighbours[point].iter().copied());
                        }
                    }
                }
            }
        }

        labels
            .into_iter()
            .map(|label| label.unwrap_or(ClusterLabel::Noise))
            .collect()
    }
}
