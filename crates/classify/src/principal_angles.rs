use crate::error::{ClassifyError, Result};
use crate::graph_classifier::{zero_padded_rows, GraphClassifier, RootedGraph, SubspaceSimilarity};
use crate::kernels::{weigh_edges_by_kernel, VertexKernel};
use aci_spectra::{eigen_gap, symmetric_eigen, MatrixRepresentation};
use ndarray::{s, Array2};

/// Nearest neighbour classification of graphs by the principal angles
/// between the eigenspaces of their matrix representations.
///
/// Each graph is represented by the eigenvectors of its smallest eigenvalues,
/// up to the largest eigengap. Subspaces of graphs of different orders are
/// compared after zero padding to the largest order.
pub struct PrincipalAnglesClassifier<K> {
    kernel: K,
    representation: MatrixRepresentation,
    similarity: SubspaceSimilarity,
    bidirectional: bool,
    subspaces: Vec<(Array2<f64>, usize)>,
}

impl<K: VertexKernel> PrincipalAnglesClassifier<K> {
    /// Graphs are expected to store each edge in both directions.
    pub fn new(kernel: K, representation: MatrixRepresentation, similarity: SubspaceSimilarity) -> Self {
        Self {
            kernel,
            representation,
            similarity,
            bidirectional: true,
            subspaces: Vec::new(),
        }
    }

    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// Orthonormal basis, as columns, of the eigenspace of the smallest
    /// eigenvalues up to the largest eigengap
    pub fn graph_subspace(&self, graph: &RootedGraph) -> Result<Array2<f64>> {
        let weighted = weigh_edges_by_kernel(&self.kernel, &graph.graph)?;
        let matrix = self
            .representation
            .sparse(&weighted, self.bidirectional)?
            .to_dense();
        let (values, vectors) = symmetric_eigen(&matrix)?;
        let dimension = (eigen_gap(&values) + 1).min(vectors.ncols());
        log::trace!("eigenvalues {values}, keeping {dimension} eigenvectors");

        Ok(vectors.slice(s![.., ..dimension]).to_owned())
    }
}

impl<K: VertexKernel> GraphClassifier for PrincipalAnglesClassifier<K> {
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

        self.subspaces = samples
            .iter()
            .zip(classes)
            .map(|(sample, &class)| Ok((self.graph_subspace(sample)?, class)))
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn predict(&self, sample: &RootedGraph) -> Result<usize> {
        if self.subspaces.is_empty() {
            return Err(ClassifyError::NotTrained);
        }

        let test = self.graph_subspace(sample)?;
        let dimension = self
            .subspaces
            .iter()
            .map(|(subspace, _)| subspace.nrows())
            .fold(test.nrows(), usize::max);
        let test = zero_padded_rows(&test, dimension);

        let mut best: Option<(f64, usize)> = None;
        for (subspace, class) in &self.subspaces {
            let similarity = self
                .similarity
                .evaluate(&test, &zero_padded_rows(subspace, dimension))?;
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
    use pretty_assertions::assert_eq;

    fn rooted(order: usize, edges: &[(usize, usize)]) -> RootedGraph {
        let mut graph = LabeledGraph::new(order);
        for &(a, b) in edges {
            graph.add_edge(a, b, 1.0);
            graph.add_edge(b, a, 1.0);
        }
        for vertex in 0..order {
            graph.set_label(vertex, vec![1.0]);
        }
        RootedGraph::new(graph, 0)
    }

    fn classifier() -> PrincipalAnglesClassifier<KroneckerKernel> {
        PrincipalAnglesClassifier::new(
            KroneckerKernel,
            MatrixRepresentation::Laplacian,
            SubspaceSimilarity::AverageCosine,
        )
    }

    #[test]
    fn test_subspace_stops_at_eigengap() {
        // path Laplacian eigenvalues 0, 1, 3: largest gap after the second
        let subspace = classifier().graph_subspace(&rooted(3, &[(0, 1), (1, 2)])).unwrap();
        assert_eq!(subspace.dim(), (3, 2));

        let gram = subspace.t().dot(&subspace);
        assert!((gram[[0, 0]] - 1.0).abs() < 1e-9);
        assert!(gram[[0, 1]].abs() < 1e-9);
    }

    #[test]
    fn test_predicts_class_of_same_shape() {
        let path = rooted(3, &[(0, 1), (1, 2)]);
        let edge = rooted(3, &[(0, 1)]);

        let mut classifier = classifier();
        assert_eq!(classifier.predict(&path), Err(ClassifyError::NotTrained));

        classifier.train(&[path.clone(), edge.clone()], &[4, 9]).unwrap();
        assert_eq!(classifier.predict(&path).unwrap(), 4);
        assert_eq!(classifier.predict(&edge).unwrap(), 9);
    }

    #[test]
    fn test_smaller_graphs_are_padded() {
        let mut classifier = classifier();
        classifier
            .train(&[rooted(4, &[(0, 1), (1, 2), (2, 3)]), rooted(2, &[(0, 1)])], &[0, 1])
            .unwrap();
        let predicted = classifier.predict(&rooted(3, &[(0, 1), (1, 2)])).unwrap();
        assert!(predicted == 0 || predicted == 1);

        assert!(classifier.train(&[rooted(2, &[(0, 1)])], &[0, 1]).is_err());
    }
}
