use crate::error::{ClassifyError, Result};
use crate::graph_classifier::{GraphClassifier, RootedGraph, SubspaceSimilarity};
use crate::kernels::{weigh_edges_by_kernel, VertexKernel};
use aci_graph::{breadth_first_order, permute_vertices};
use aci_spectra::{symmetric_eigen, MatrixRepresentation};
use ndarray::{s, Array2};

/// Nearest neighbour classification of graphs by the Dirichlet eigenvectors
/// of subgraphs grown around their root.
///
/// Vertices are renumbered in breadth first order from the root, so the
/// subgraph induced by the first vertices of that order is a leading block of
/// the normalized Laplacian, whose eigenvectors are the Dirichlet
/// eigenvectors of the subgraph. Two graphs are compared through the
/// principal angles between the smallest such eigenvectors.
pub struct DirichletEigenSubspaceClassifier<K> {
    kernel: K,
    eigenvectors: usize,
    min_subgraph_size: f64,
    similarity: SubspaceSimilarity,
    bidirectional: bool,
    training: Vec<(Array2<f64>, usize)>,
}

impl<K: VertexKernel> DirichletEigenSubspaceClassifier<K> {
    /// `min_subgraph_size` is the size of the compared subgraphs relative to
    /// the smallest graph of each comparison, in `(0, 1)`. At least one
    /// vertex is always left out as the boundary.
    pub fn new(
        kernel: K,
        eigenvectors: usize,
        min_subgraph_size: f64,
        similarity: SubspaceSimilarity,
    ) -> Result<Self> {
        if eigenvectors == 0 {
            return Err(ClassifyError::InvalidParameter(
                "at least one eigenvector is needed".into(),
            ));
        }
        if !(min_subgraph_size > 0.0 && min_subgraph_size < 1.0) {
            return Err(ClassifyError::InvalidParameter(format!(
                "subgraph size ratio must be in (0, 1), got {min_subgraph_size}"
            )));
        }
        Ok(Self {
            kernel,
            eigenvectors,
            min_subgraph_size,
            similarity,
            bidirectional: true,
            training: Vec::new(),
        })
    }

    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// Normalized Laplacian with vertices in breadth first order from the root
    pub fn breadth_first_laplacian(&self, graph: &RootedGraph) -> Result<Array2<f64>> {
        let weighted = weigh_edges_by_kernel(&self.kernel, &graph.graph)?;
        let order = breadth_first_order(&weighted, graph.root)?;
        let permuted = permute_vertices(&weighted, &order)?;
        Ok(MatrixRepresentation::NormalizedLaplacian
            .sparse(&permuted, self.bidirectional)?
            .to_dense())
    }

    fn similarity_between(&self, l1: &Array2<f64>, l2: &Array2<f64>) -> Result<f64> {
        let smaller = l1.nrows().min(l2.nrows());
        let size = ((smaller as f64 * self.min_subgraph_size).floor() as usize).min(smaller.saturating_sub(1));
        if size == 0 {
            return Ok(0.0);
        }
        let columns = self.eigenvectors.min(size);

        let (_, vectors1) = symmetric_eigen(&l1.slice(s![..size, ..size]).to_owned())?;
        let (_, vectors2) = symmetric_eigen(&l2.slice(s![..size, ..size]).to_owned())?;
        self.similarity.evaluate(
            &vectors1.slice(s![.., ..columns]).to_owned(),
            &vectors2.slice(s![.., ..columns]).to_owned(),
        )
    }
}

impl<K: VertexKernel> GraphClassifier for DirichletEigenSubspaceClassifier<K> {
    fn train(&mut self, samples: &[RootedGraph], classes: &[usize]) -> Result<()> {
        if samples.len() != classes.len() {
            return Err(ClassifyError::SizeMismatch {
                expected: samples.len(),
                actual: classes.len(),
            });
        }
        if samples.is_empty() {
            return Err(ClassifyError::InvalidParameter("no training samples".into()));
        }

        self.training = samples
            .iter()
            .zip(classes)
            .map(|(sample, &class)| Ok((self.breadth_first_laplacian(sample)?, class)))
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn predict(&self, sample: &RootedGraph) -> Result<usize> {
        if self.training.is_empty() {
            return Err(ClassifyError::NotTrained);
        }

        let laplacian = self.breadth_first_laplacian(sample)?;
        let mut best: Option<(f64, usize)> = None;
        for (training, class) in &self.training {
            let similarity = self.similarity_between(&laplacian, training)?;
            if best.map_or(true, |(largest, _)| similarity > largest) {
                best = Some((similarity, *class));
            }
        }

        best.map(|(_, class)| class).ok_or(ClassifyError::NotTrained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::KroneckerKernel;
    use aci_graph::LabeledGraph;

    fn rooted(order: usize, edges: &[(usize, usize)], root: usize) -> RootedGraph {
        let mut graph = LabeledGraph::new(order);
        for &(a, b) in edges {
            graph.add_edge(a, b, 1.0);
            graph.add_edge(b, a, 1.0);
        }
        for vertex in 0..order {
            graph.set_label(vertex, vec![1.0]);
        }
        RootedGraph::new(graph, root)
    }

    fn classifier() -> DirichletEigenSubspaceClassifier<KroneckerKernel> {
        DirichletEigenSubspaceClassifier::new(KroneckerKernel, 2, 0.8, SubspaceSimilarity::AverageCosine)
            .unwrap()
    }

    #[test]
    fn test_laplacian_follows_breadth_first_order() {
        // root 2 of the path 0-1-2: order 2, 1, 0
        let laplacian = classifier()
            .breadth_first_laplacian(&rooted(3, &[(0, 1), (1, 2)], 2))
            .unwrap();
        let half = 0.5f64.sqrt();
        assert!((laplacian[[0, 1]] + half).abs() < 1e-9);
        assert!(laplacian[[0, 2]].abs() < 1e-9);
        assert!((laplacian[[1, 2]] + half).abs() < 1e-9);
    }

    #[test]
    fn test_leave_one_out_on_stars_and_paths() {
        let star = [(0, 1), (0, 2), (0, 3), (0, 4)];
        let path = [(0, 1), (1, 2), (2, 3), (3, 4)];
        // same shapes with other vertex numbering and root
        let star_renumbered = [(3, 0), (3, 1), (3, 2), (3, 4)];
        let path_renumbered = [(4, 3), (3, 2), (2, 1), (1, 0)];
        let samples = vec![
            rooted(5, &star, 0),
            rooted(5, &star_renumbered, 3),
            rooted(5, &path, 0),
            rooted(5, &path_renumbered, 4),
        ];

        let rate = classifier()
            .leave_one_out_recognition_rate(&samples, &[0, 0, 1, 1])
            .unwrap();
        assert_eq!(rate, 1.0);
    }

    #[test]
    fn test_tiny_graphs_have_no_similarity() {
        let classifier = classifier();
        let single = classifier.breadth_first_laplacian(&rooted(1, &[], 0)).unwrap();
        let pair = classifier.breadth_first_laplacian(&rooted(2, &[(0, 1)], 0)).unwrap();
        assert_eq!(classifier.similarity_between(&single, &pair).unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(DirichletEigenSubspaceClassifier::new(KroneckerKernel, 0, 0.5, SubspaceSimilarity::AverageCosine).is_err());
        assert!(DirichletEigenSubspaceClassifier::new(KroneckerKernel, 1, 1.0, SubspaceSimilarity::AverageCosine).is_err());
        assert!(classifier()
            .predict(&rooted(2, &[(0, 1)], 0))
            .is_err());
        assert!(classifier().train(&[rooted(2, &[(0, 1)], 5)], &[0]).is_err());
    }
}
