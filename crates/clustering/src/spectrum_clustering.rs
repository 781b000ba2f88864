use crate::error::{ClusteringError, Result};
use crate::kmeans::kmeans;
use aci_graph::WeightedGraph;
use aci_spectra::{symmetric_sparse_eigen_solver, EigenSelection, MatrixRepresentation};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

const KMEANS_MAX_ITERATIONS: usize = 100;
const KMEANS_ATTEMPTS: usize = 5;

/// Clusters graphs by k-means on their `k` smallest non trivial eigenvalues
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumDistanceClustering {
    matrix_rep: MatrixRepresentation,
    k: usize,
    bidirectional: bool,
}

impl SpectrumDistanceClustering {
    /// Clustering of bidirectional graphs, such as segmentation graphs
    pub fn new(matrix_rep: MatrixRepresentation, k: usize) -> Self {
        Self {
            matrix_rep,
            k,
            bidirectional: true,
        }
    }

    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// Spectrum of each graph as rows: eigenvalues `1..=k` in ascending order,
    /// the smallest one being dropped
    pub fn spectra(&self, graphs: &[WeightedGraph]) -> Result<Array2<f64>> {
        let mut spectra = Array2::zeros((graphs.len(), self.k));

        for (i, graph) in graphs.iter().enumerate() {
            let order = graph.number_of_vertices();
            if self.k + 1 > order {
                return Err(ClusteringError::InvalidClusterCount {
                    k: self.k + 1,
                    samples: order,
                });
            }

            let matrix = self.matrix_rep.sparse(graph, self.bidirectional)?;
            let (values, _) = symmetric_sparse_eigen_solver(
                &matrix,
                EigenSelection::SmallestAlgebraic,
                self.k + 1,
                order,
            )?;

            for j in 0..self.k {
                spectra[[i, j]] = values[j + 1];
            }
        }

        Ok(spectra)
    }

    /// Class of each graph, in `0..nb_classes`
    pub fn cluster(&self, graphs: &[WeightedGraph], nb_classes: usize) -> Result<Vec<usize>> {
        let spectra = self.spectra(graphs)?;
        log::debug!(
            "clustering {} spectra of dimension {} into {nb_classes} classes",
            graphs.len(),
            self.k
        );
        Ok(kmeans(&spectra, nb_classes, KMEANS_MAX_ITERATIONS, KMEANS_ATTEMPTS)?.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bidirectional(order: usize, edges: &[(usize, usize)]) -> WeightedGraph {
        let mut graph = WeightedGraph::new(order);
        for &(a, b) in edges {
            graph.add_edge(a, b, 1.0);
            graph.add_edge(b, a, 1.0);
        }
        graph
    }

    fn complete(order: usize) -> WeightedGraph {
        let edges: Vec<(usize, usize)> = (0..order)
            .flat_map(|a| (a + 1..order).map(move |b| (a, b)))
            .collect();
        bidirectional(order, &edges)
    }

    fn path(order: usize) -> WeightedGraph {
        let edges: Vec<(usize, usize)> = (0..order - 1).map(|a| (a, a + 1)).collect();
        bidirectional(order, &edges)
    }

    #[test]
    fn test_spectra_of_complete_graph() {
        let clustering = SpectrumDistanceClustering::new(MatrixRepresentation::Laplacian, 2);
        let spectra = clustering.spectra(&[complete(4)]).unwrap();
        // non zero Laplacian eigenvalues of K4 are all 4
        assert!((spectra[[0, 0]] - 4.0).abs() < 1e-9);
        assert!((spectra[[0, 1]] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_cluster_separates_graph_families() {
        let graphs = vec![complete(5), path(5), complete(6), path(6), complete(5)];
        let clustering = SpectrumDistanceClustering::new(MatrixRepresentation::Laplacian, 2);
        let labels = clustering.cluster(&graphs, 2).unwrap();

        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[0], labels[4]);
        assert_eq!(labels[1], labels[3]);
        assert_ne!(labels[0], labels[1]);
    }

    #[test]
    fn test_rejects_small_graphs() {
        let clustering = SpectrumDistanceClustering::new(MatrixRepresentation::Laplacian, 3);
        assert!(clustering.spectra(&[path(3)]).is_err());
    }
}
