use crate::error::{ClusteringError, Result};
use crate::similarity::FunctionSimilarityMatrix;
use crate::similarity_graphs::similarity_knn;
use aci_spectra::{
    conjugate_gradient, symmetric_sparse_eigen_solver, CsrMatrix, EigenSelection, LinearOperator,
};
use ndarray::{s, Array1, Array2, ArrayView1};

/// Tikhonov regularization of the local Gram matrices, relative to their trace
const REGULARIZATION: f64 = 1e-3;
const WEIGHTS_TOLERANCE: f64 = 1e-12;

/// `(I - W)ᵀ (I - W)` applied without forming it
struct EmbeddingCost<'a> {
    weights: &'a CsrMatrix,
}

impl LinearOperator for EmbeddingCost<'_> {
    fn order(&self) -> usize {
        self.weights.rows()
    }

    fn apply(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let n = self.order();
        let residual = Array1::from_iter(
            (0..n).map(|i| x[i] - self.weights.row(i).map(|(j, w)| w * x[j]).sum::<f64>()),
        );

        let mut result = residual.clone();
        for i in 0..n {
            for (j, w) in self.weights.row(i) {
                result[j] -= w * residual[i];
            }
        }
        result
    }
}

/// Weights reconstructing `samples[i]` from its neighbours, summing to 1
fn reconstruction_weights(samples: &Array2<f64>, i: usize, neighbors: &[usize]) -> Result<Array1<f64>> {
    let k = neighbors.len();
    let sample = samples.row(i);
    let differences = Array2::from_shape_fn((k, samples.ncols()), |(u, c)| {
        sample[c] - samples[[neighbors[u], c]]
    });

    let mut gram = differences.dot(&differences.t());
    let trace = gram.diag().sum();
    let regularization = if trace > 0.0 { REGULARIZATION * trace } else { REGULARIZATION };
    for u in 0..k {
        gram[[u, u]] += regularization;
    }

    let ones = Array1::ones(k);
    let solution = conjugate_gradient(&gram, ones.view(), None, WEIGHTS_TOLERANCE, 10 * k)?;
    let total = solution.solution.sum();
    if total == 0.0 || !total.is_finite() {
        return Err(ClusteringError::Reconstruction(i));
    }
    Ok(solution.solution / total)
}

/// Locally linear embedding (Roweis and Saul) of the rows of `samples` into
/// `out_dim` dimensions, each sample reconstructed from its `k` nearest
/// neighbours by Euclidean distance.
///
/// The embedding is given by the eigenvectors of the `out_dim + 1` smallest
/// eigenvalues of `(I - W)ᵀ (I - W)`, without the first (constant) one.
pub fn locally_linear_embedding(samples: &Array2<f64>, out_dim: usize, k: usize) -> Result<Array2<f64>> {
    let (n, dimension) = samples.dim();
    if out_dim == 0 || out_dim >= dimension || out_dim + 1 > n {
        return Err(ClusteringError::InvalidDimension {
            requested: out_dim,
            samples: n,
            dimension,
        });
    }
    if k == 0 {
        return Err(ClusteringError::InvalidNeighborCount { k, rows: n });
    }

    let rows: Vec<Array1<f64>> = samples.rows().into_iter().map(|row| row.to_owned()).collect();
    let closeness = FunctionSimilarityMatrix::new(rows, |a: &Array1<f64>, b: &Array1<f64>| {
        -(a - b).mapv(|x| x * x).sum()
    });
    let neighbors = similarity_knn(&closeness, k)?;

    let mut triplets = Vec::with_capacity(n * k);
    for (i, nearest) in neighbors.iter().enumerate() {
        let weights = reconstruction_weights(samples, i, nearest)?;
        triplets.extend(nearest.iter().zip(weights.iter()).map(|(&j, &w)| (i, j, w)));
    }
    let weights = CsrMatrix::from_triplets(n, n, &triplets)?;

    let (values, vectors) = symmetric_sparse_eigen_solver(
        &EmbeddingCost { weights: &weights },
        EigenSelection::SmallestAlgebraic,
        out_dim + 1,
        n,
    )?;
    log::debug!("locally linear embedding eigenvalues {values}");

    Ok(vectors.slice(s![.., 1..]).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_points_on_a_line_keep_their_order() {
        let positions = [3.0, 0.0, 5.0, 1.0, 7.0, 2.0, 6.0, 4.0];
        let samples = Array2::from_shape_fn((8, 2), |(i, c)| positions[i] * (c + 1) as f64);

        let embedding = locally_linear_embedding(&samples, 1, 2).unwrap();
        assert_eq!(embedding.dim(), (8, 1));

        let column = embedding.column(0);
        assert!(column.sum().abs() < 1e-6);
        let mean = positions.iter().sum::<f64>() / 8.0;
        let centered: Vec<f64> = positions.iter().map(|p| p - mean).collect();
        let covariance: f64 = column.iter().zip(&centered).map(|(x, p)| x * p).sum();
        let norms = column.dot(&column).sqrt() * centered.iter().map(|p| p * p).sum::<f64>().sqrt();
        assert!((covariance / norms).abs() > 0.99);
    }

    #[test]
    fn test_reconstruction_weights_sum_to_one() {
        let samples = array![[0.0, 0.0], [1.0, 0.0], [-1.0, 0.0], [0.0, 3.0]];
        let weights = reconstruction_weights(&samples, 0, &[1, 2]).unwrap();
        assert!((weights.sum() - 1.0).abs() < 1e-12);
        assert!((weights[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_dimensions() {
        let samples = array![[0.0, 1.0], [1.0, 2.0], [2.0, 4.0]];
        assert!(locally_linear_embedding(&samples, 2, 1).is_err());
        assert!(locally_linear_embedding(&samples, 0, 1).is_err());
        assert!(locally_linear_embedding(&samples, 1, 0).is_err());
        assert!(locally_linear_embedding(&samples, 1, 3).is_err());
    }
}
