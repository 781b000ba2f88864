use crate::error::{ClusteringError, Result};
use ndarray::{Array2, ArrayView1, Axis};

/// Result of a k-means clustering
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster of each sample, in `0..k`
    pub labels: Vec<usize>,
    /// Cluster centers as rows
    pub centers: Array2<f64>,
    /// Sum of squared distances from each sample to its center
    pub compactness: f64,
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Farthest-first seeding from a given first sample
fn farthest_first_centers(samples: &Array2<f64>, k: usize, first: usize) -> Array2<f64> {
    let n = samples.nrows();
    let mut chosen = vec![first];
    let mut nearest: Vec<f64> = (0..n)
        .map(|i| squared_distance(samples.row(i), samples.row(first)))
        .collect();

    while chosen.len() < k {
        let mut next = 0;
        for i in 1..n {
            if nearest[i] > nearest[next] {
                next = i;
            }
        }
        chosen.push(next);
        for (i, distance) in nearest.iter_mut().enumerate() {
            *distance = distance.min(squared_distance(samples.row(i), samples.row(next)));
        }
    }

    samples.select(Axis(0), &chosen)
}

fn nearest_center(sample: ArrayView1<f64>, centers: &Array2<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (index, center) in centers.rows().into_iter().enumerate() {
        let distance = squared_distance(sample, center);
        if distance < best.1 {
            best = (index, distance);
        }
    }
    best
}

fn lloyd(samples: &Array2<f64>, mut centers: Array2<f64>, max_iterations: usize) -> KMeansResult {
    let (n, dimension) = samples.dim();
    let k = centers.nrows();
    let mut labels = vec![usize::MAX; n];

    for iteration in 0..max_iterations.max(1) {
        let mut changed = false;
        for (i, sample) in samples.rows().into_iter().enumerate() {
            let (label, _) = nearest_center(sample, &centers);
            if labels[i] != label {
                labels[i] = label;
                changed = true;
            }
        }

        if !changed {
            log::debug!("k-means converged after {iteration} iterations");
            break;
        }

        let mut sums = Array2::<f64>::zeros((k, dimension));
        let mut counts = vec![0usize; k];
        for (i, sample) in samples.rows().into_iter().enumerate() {
            let mut row = sums.row_mut(labels[i]);
            row += &sample;
            counts[labels[i]] += 1;
        }
        for (cluster, &count) in counts.iter().enumerate() {
            // an empty cluster keeps its previous center
            if count > 0 {
                let mean = &sums.row(cluster) / count as f64;
                centers.row_mut(cluster).assign(&mean);
            }
        }
    }

    // labels follow the returned centers, also when iterations ran out
    let mut compactness = 0.0;
    for (i, sample) in samples.rows().into_iter().enumerate() {
        let (label, distance) = nearest_center(sample, &centers);
        labels[i] = label;
        compactness += distance;
    }

    KMeansResult {
        labels,
        centers,
        compactness,
    }
}

/// Cluster the rows of `samples` into `k` clusters with Lloyd's algorithm.
///
/// Seeding is deterministic: attempt `a` starts from sample `a * n / attempts`
/// and adds the sample farthest from the centers chosen so far until there
/// are `k` of them. The most compact attempt wins.
pub fn kmeans(
    samples: &Array2<f64>,
    k: usize,
    max_iterations: usize,
    attempts: usize,
) -> Result<KMeansResult> {
    let n = samples.nrows();
    if k == 0 || k > n {
        return Err(ClusteringError::InvalidClusterCount { k, samples: n });
    }

    let attempts = attempts.max(1);
    let mut best: Option<KMeansResult> = None;

    for attempt in 0..attempts {
        let first = attempt * n / attempts;
        let centers = farthest_first_centers(samples, k, first);
        let result = lloyd(samples, centers, max_iterations);

        if best
            .as_ref()
            .map_or(true, |current| result.compactness < current.compactness)
        {
            best = Some(result);
        }
    }

    best.ok_or(ClusteringError::InvalidClusterCount { k, samples: n })
}
