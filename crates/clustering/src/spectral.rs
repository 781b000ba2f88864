use crate::error::{ClusteringError, Result};
use crate::kmeans::kmeans;
use crate::similarity::SimilarityMatrix;
use crate::similarity_graphs::SimilarityGraphRepresentation;
use aci_graph::WeightedGraph;
use aci_spectra::{symmetric_sparse_eigen_solver, EigenSelection, MatrixRepresentation};
use ndarray::{s, Array2};

const KMEANS_MAX_ITERATIONS: usize = 100;
const KMEANS_ATTEMPTS: usize = 5;

/// Embed the vertices of a similarity graph (stored once per edge) into `k`
/// dimensions: the eigenvectors of the `k + 1` smallest eigenvalues of its
/// matrix representation, without the first one.
pub fn graph_spectral_embedding(
    graph: &WeightedGraph,
    matrix_rep: MatrixRepresentation,
    k: usize,
    normalize: bool,
) -> Result<Array2<f64>> {
    let n = graph.number_of_vertices();
    if k == 0 || k + 1 > n {
        return Err(ClusteringError::InvalidClusterCount { k, samples: n });
    }

    let matrix = matrix_rep.sparse(graph, false)?;
    let (_, vectors) =
        symmetric_sparse_eigen_solver(&matrix, EigenSelection::SmallestAlgebraic, k + 1, n)?;
    let mut embedding = vectors.slice(s![.., 1..]).to_owned();

    if normalize {
        for mut row in embedding.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row /= norm;
            }
        }
    }

    Ok(embedding)
}

/// Spectral embedding of the samples of a similarity matrix.
///
/// Row normalization gives the Ng, Jordan and Weiss variant.
pub fn spectral_embedding(
    similarity: &dyn SimilarityMatrix,
    graph_rep: &dyn SimilarityGraphRepresentation,
    matrix_rep: MatrixRepresentation,
    k: usize,
    normalize: bool,
) -> Result<Array2<f64>> {
    let graph = graph_rep.graph(similarity)?;
    log::debug!(
        "similarity graph with {} vertices and {} edges",
        graph.number_of_vertices(),
        graph.number_of_edges()
    );
    graph_spectral_embedding(&graph, matrix_rep, k, normalize)
}

/// Cluster the samples of a similarity matrix into `k` classes by k-means on
/// their spectral embedding. Returns the class of each vertex of the
/// similarity graph.
pub fn spectral_clustering(
    similarity: &dyn SimilarityMatrix,
    graph_rep: &dyn SimilarityGraphRepresentation,
    matrix_rep: MatrixRepresentation,
    k: usize,
    normalize: bool,
) -> Result<Vec<usize>> {
    let embedding = spectral_embedding(similarity, graph_rep, matrix_rep, k, normalize)?;
    let result = kmeans(&embedding, k, KMEANS_MAX_ITERATIONS, KMEANS_ATTEMPTS)?;
    Ok(result.labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::FunctionSimilarityMatrix;
    use crate::similarity_graphs::{CompleteGraph, KNearestGraph};

    fn two_groups() -> FunctionSimilarityMatrix<f64, impl Fn(&f64, &f64) -> f64> {
        let samples = vec![0.0, 0.2, 0.4, 0.1, 10.0, 10.3, 10.1, 10.2];
        FunctionSimilarityMatrix::new(samples, |a: &f64, b: &f64| (-(a - b).powi(2)).exp())
    }

    #[test]
    fn test_spectral_clustering_keeps_tight_groups_together() {
        let samples = vec![0.0, 0.1, 0.2, 10.0, 10.1, 10.2, 20.0, 20.1, 20.2];
        let similarity =
            FunctionSimilarityMatrix::new(samples, |a: &f64, b: &f64| (-(a - b).powi(2) / 20.0).exp());
        let labels = spectral_clustering(
            &similarity,
            &CompleteGraph,
            MatrixRepresentation::NormalizedLaplacian,
            2,
            false,
        )
        .unwrap();

        assert_eq!(labels.len(), 9);
        for group in labels.chunks(3) {
            assert!(group.iter().all(|&label| label == group[0]));
        }
        assert!(labels.contains(&0));
        assert!(labels.contains(&1));
    }

    #[test]
    fn test_embedding_dimensions_and_normalization() {
        let similarity = two_groups();
        let embedding = spectral_embedding(
            &similarity,
            &KNearestGraph { k: 3 },
            MatrixRepresentation::Laplacian,
            2,
            true,
        )
        .unwrap();

        assert_eq!(embedding.dim(), (8, 2));
        for row in embedding.rows() {
            let norm = row.dot(&row).sqrt();
            assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_embedding_rejects_too_many_dimensions() {
        let similarity = two_groups();
        let result = spectral_embedding(
            &similarity,
            &CompleteGraph,
            MatrixRepresentation::Laplacian,
            8,
            false,
        );
        assert!(result.is_err());
    }
}
