use crate::error::{ClassifyError, Result};
use crate::kernels::{weigh_edges_by_kernel, VertexKernel};
use crate::stat_model::TrainableStatModel;
use aci_graph::LabeledGraph;
use aci_spectra::{symmetric_eigen, MatrixRepresentation};
use ndarray::{s, Array2};

/// Classifies segmentation graphs by the spectrum of their matrix
/// representation, with edges weighted by a kernel between vertex labels.
pub struct SpectrumDistanceClassifier<K> {
    kernel: K,
    model: Box<dyn TrainableStatModel>,
    representation: MatrixRepresentation,
    mu: f64,
    bidirectional: bool,
}

impl<K: VertexKernel> SpectrumDistanceClassifier<K> {
    /// Eigenvalues `λ` become `exp(-mu * λ)`, `mu` must be positive.
    /// Graphs are expected to store each edge in both directions.
    pub fn new(
        kernel: K,
        model: Box<dyn TrainableStatModel>,
        representation: MatrixRepresentation,
        mu: f64,
    ) -> Result<Self> {
        if mu.is_nan() || mu <= 0.0 {
            return Err(ClassifyError::InvalidParameter(format!("mu must be positive, got {mu}")));
        }
        Ok(Self {
            kernel,
            model,
            representation,
            mu,
            bidirectional: true,
        })
    }

    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// One row per graph: the mapped eigenvalues, in ascending eigenvalue
    /// order, of the representation zero-padded to the largest graph order.
    pub fn spectra(&self, graphs: &[LabeledGraph<Vec<f32>>]) -> Result<Array2<f64>> {
        let order = graphs
            .iter()
            .map(|graph| graph.number_of_vertices())
            .max()
            .unwrap_or(0);
        let mut spectra = Array2::zeros((graphs.len(), order));

        for (index, graph) in graphs.iter().enumerate() {
            let weighted = weigh_edges_by_kernel(&self.kernel, graph)?;
            let matrix = self
                .representation
                .sparse(&weighted, self.bidirectional)?
                .to_dense();
            let n = matrix.nrows();

            let mut padded = Array2::zeros((order, order));
            padded.slice_mut(s![..n, ..n]).assign(&matrix);
            let (eigenvalues, _) = symmetric_eigen(&padded)?;

            spectra
                .row_mut(index)
                .assign(&eigenvalues.mapv(|lambda| (-self.mu * lambda).exp()));
        }

        Ok(spectra)
    }

    /// Leave one out recognition rate of the statistical model on the graph
    /// spectra
    pub fn leave_one_out_recognition_rate(
        &mut self,
        graphs: &[LabeledGraph<Vec<f32>>],
        classes: &[usize],
    ) -> Result<f64> {
        if graphs.len() != classes.len() {
            return Err(ClassifyError::SizeMismatch {
                expected: graphs.len(),
                actual: classes.len(),
            });
        }

        let spectra = self.spectra(graphs)?;
        log::debug!(
            "spectra of {} graphs with up to {} vertices",
            spectra.nrows(),
            spectra.ncols()
        );
        self.model.leave_one_out_cross_validation(spectra.view(), classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::GaussianKernel;
    use crate::stat_model::KNearestModel;

    fn labeled(order: usize, edges: &[(usize, usize)], label: f32) -> LabeledGraph<Vec<f32>> {
        let mut graph = LabeledGraph::new(order);
        for &(a, b) in edges {
            graph.add_edge(a, b, 1.0);
            graph.add_edge(b, a, 1.0);
        }
        for vertex in 0..order {
            graph.set_label(vertex, vec![label]);
        }
        graph
    }

    fn classifier() -> SpectrumDistanceClassifier<GaussianKernel> {
        SpectrumDistanceClassifier::new(
            GaussianKernel { mu: 1.0, sigma: 1.0 },
            Box::new(KNearestModel::new(1)),
            MatrixRepresentation::Laplacian,
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn test_spectra_are_padded_and_mapped() {
        let graphs = vec![labeled(2, &[(0, 1)], 0.0), labeled(3, &[(0, 1), (1, 2)], 0.0)];
        let spectra = classifier().spectra(&graphs).unwrap();
        assert_eq!(spectra.dim(), (2, 3));

        // edge of weight 1: eigenvalues 0, 2, and the padding 0
        let expected = [1.0, 1.0, (-1.0f64).exp()];
        for (value, expected) in spectra.row(0).iter().zip(expected) {
            assert!((value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_leave_one_out_on_graph_families() {
        let triangle = [(0, 1), (1, 2), (2, 0)];
        let path = [(0, 1), (1, 2), (2, 3)];
        let graphs = vec![
            labeled(3, &triangle, 0.0),
            labeled(3, &triangle, 0.1),
            labeled(3, &triangle, 0.2),
            labeled(4, &path, 0.0),
            labeled(4, &path, 0.1),
            labeled(4, &path, 0.2),
        ];
        let rate = classifier()
            .leave_one_out_recognition_rate(&graphs, &[0, 0, 0, 1, 1, 1])
            .unwrap();
        assert_eq!(rate, 1.0);
    }

    #[test]
    fn test_invalid_parameters() {
        let result = SpectrumDistanceClassifier::new(
            GaussianKernel { mu: 1.0, sigma: 1.0 },
            Box::new(KNearestModel::new(1)),
            MatrixRepresentation::Laplacian,
            0.0,
        );
        assert!(result.is_err());

        let graphs = vec![labeled(2, &[(0, 1)], 0.0)];
        assert!(classifier().leave_one_out_recognition_rate(&graphs, &[0, 1]).is_err());
    }
}
