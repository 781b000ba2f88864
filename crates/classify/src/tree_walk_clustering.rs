use crate::error::{ClassifyError, Result};
use crate::kernels::VertexKernel;
use crate::tree_walk::tree_walk_kernel;
use aci_clustering::{kmeans, spectral_embedding, CompleteGraph, DenseSimilarityMatrix};
use aci_graph::LabeledGraph;
use aci_spectra::MatrixRepresentation;
use ndarray::Array2;

const KMEANS_MAX_ITERATIONS: usize = 100;
const KMEANS_ATTEMPTS: usize = 5;

/// Labeled segmentation graph, stored bidirectionally, with the position of
/// each segment
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarGraph {
    pub graph: LabeledGraph<Vec<f32>>,
    pub positions: Vec<[f32; 2]>,
}

impl PlanarGraph {
    pub fn new(graph: LabeledGraph<Vec<f32>>, positions: Vec<[f32; 2]>) -> Self {
        Self { graph, positions }
    }
}

/// Spectral clustering of whole segmentation graphs, with the tree-walk
/// kernel between them as similarity.
pub struct TreeWalkSpectralClustering<K> {
    kernel: K,
    depth: usize,
    arity: usize,
}

impl<K: VertexKernel> TreeWalkSpectralClustering<K> {
    pub fn new(kernel: K, depth: usize, arity: usize) -> Result<Self> {
        if arity == 0 {
            return Err(ClassifyError::InvalidParameter("arity must be positive".into()));
        }
        Ok(Self { kernel, depth, arity })
    }

    /// Tree-walk kernel between every pair of graphs, normalized to
    /// `k(i, j) / sqrt(k(i, i) k(j, j))`. Graphs with a null kernel against
    /// themselves have null similarities.
    pub fn similarity_matrix(&self, graphs: &[PlanarGraph]) -> Result<Array2<f64>> {
        let n = graphs.len();
        let mut kernels = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let value = tree_walk_kernel(
                    &self.kernel,
                    self.depth,
                    self.arity,
                    &graphs[i].graph,
                    &graphs[i].positions,
                    &graphs[j].graph,
                    &graphs[j].positions,
                )?;
                kernels[[i, j]] = value;
                kernels[[j, i]] = value;
            }
        }

        let diagonal = kernels.diag().to_owned();
        Ok(Array2::from_shape_fn((n, n), |(i, j)| {
            let norm = (diagonal[i] * diagonal[j]).sqrt();
            if norm > 0.0 {
                kernels[[i, j]] / norm
            } else {
                0.0
            }
        }))
    }

    /// Embedding of the graphs into `out_dim` dimensions, one row per graph,
    /// from the normalized Laplacian of their complete similarity graph
    pub fn embed(&self, graphs: &[PlanarGraph], out_dim: usize) -> Result<Array2<f64>> {
        let similarity = DenseSimilarityMatrix::new(self.similarity_matrix(graphs)?);
        log::debug!("tree-walk similarities between {} graphs", graphs.len());
        Ok(spectral_embedding(
            &similarity,
            &CompleteGraph,
            MatrixRepresentation::NormalizedLaplacian,
            out_dim,
            false,
        )?)
    }

    /// Cluster of each graph among `classes`, by k-means on their embedding
    /// into `classes - 1` dimensions
    pub fn cluster(&self, graphs: &[PlanarGraph], classes: usize) -> Result<Vec<usize>> {
        if classes == 0 || classes > graphs.len() {
            return Err(ClassifyError::InvalidParameter(format!(
                "cannot form {classes} clusters from {} graphs",
                graphs.len()
            )));
        }
        if classes == 1 {
            return Ok(vec![0; graphs.len()]);
        }

        let embedding = self.embed(graphs, classes - 1)?;
        let result = kmeans(&embedding, classes, KMEANS_MAX_ITERATIONS, KMEANS_ATTEMPTS)?;
        log::debug!("tree-walk clustering compactness {:.6e}", result.compactness);
        Ok(result.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::TreeWalkBasisKernel;
    use pretty_assertions::assert_eq;

    /// Two segments of the same color side by side
    fn pair(a: f32) -> PlanarGraph {
        let mut graph = LabeledGraph::new(2);
        graph.add_edge(0, 1, 1.0);
        graph.add_edge(1, 0, 1.0);
        graph.set_label(0, vec![50.0, a, 0.0, 0.5]);
        graph.set_label(1, vec![50.0, a, 0.0, 0.5]);
        PlanarGraph::new(graph, vec![[0.0, 0.0], [0.0, 1.0]])
    }

    fn clustering() -> TreeWalkSpectralClustering<TreeWalkBasisKernel> {
        TreeWalkSpectralClustering::new(TreeWalkBasisKernel { mu_c: 1e-3, mu_a: 1.0 }, 1, 1).unwrap()
    }

    #[test]
    fn test_similarity_is_normalized() {
        let similarity = clustering().similarity_matrix(&[pair(0.0), pair(40.0)]).unwrap();
        assert!((similarity[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((similarity[[1, 1]] - 1.0).abs() < 1e-12);
        // each of the 4 vertex pairs: two basis kernels of exp(-1.6)
        let expected = (-3.2f64).exp();
        assert!((similarity[[0, 1]] - expected).abs() < 1e-9);
        assert_eq!(similarity[[0, 1]], similarity[[1, 0]]);
    }

    #[test]
    fn test_clusters_graphs_by_color() {
        let graphs = vec![pair(0.0), pair(40.0), pair(1.0), pair(41.0), pair(0.5), pair(40.5)];
        let labels = clustering().cluster(&graphs, 2).unwrap();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[0], labels[4]);
        assert_eq!(labels[1], labels[3]);
        assert_eq!(labels[1], labels[5]);
        assert!(labels[0] != labels[1]);

        assert_eq!(clustering().cluster(&graphs, 1).unwrap(), vec![0; 6]);
        assert!(clustering().cluster(&graphs, 7).is_err());
    }

    #[test]
    fn test_embedding_dimensions() {
        let graphs = vec![pair(0.0), pair(40.0), pair(20.0)];
        assert_eq!(clustering().embed(&graphs, 2).unwrap().dim(), (3, 2));
        assert!(clustering().embed(&graphs, 3).is_err());
    }
}
