use crate::error::{ClassifyError, Result};
use crate::graph_classifier::{GraphClassifier, RootedGraph};
use crate::stat_model::{KNearestModel, TrainableStatModel};
use aci_clustering::{DenseSimilarityMatrix, KNearestGraph, SimilarityGraphRepresentation};
use aci_graph::{breadth_first_order, permute_vertices, WeightedGraph};
use aci_spectra::pattern_vectors;
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

/// Largest number of neighbours of a segment in a feature graph
const FEATURE_GRAPH_NEIGHBORS: usize = 8;

/// Range `start..end` of the vertex labels compared by a Gaussian similarity
/// `exp(-|a - b|² / sigma²)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpace {
    pub start: usize,
    pub end: usize,
    pub sigma: f64,
}

impl FeatureSpace {
    pub fn new(start: usize, end: usize, sigma: f64) -> Self {
        Self { start, end, sigma }
    }

    /// Graph of the `min(8, n - 1)` most similar segments of each segment
    /// in this feature space, with vertices in breadth first order from the
    /// root. Each edge is stored once.
    pub fn feature_graph(&self, sample: &RootedGraph) -> Result<WeightedGraph> {
        let n = sample.graph.number_of_vertices();
        let features = sample
            .graph
            .labels()
            .iter()
            .enumerate()
            .map(|(vertex, label)| {
                let label = label.as_deref().ok_or(ClassifyError::UnlabeledVertex(vertex))?;
                label.get(self.start..self.end).ok_or(ClassifyError::LabelDimension {
                    expected: self.end,
                    actual: label.len(),
                })
            })
            .collect::<Result<Vec<&[f32]>>>()?;

        let sigma2 = self.sigma * self.sigma;
        let similarity = DenseSimilarityMatrix::new(Array2::from_shape_fn((n, n), |(i, j)| {
            let distance: f64 = features[i]
                .iter()
                .zip(features[j])
                .map(|(&a, &b)| (f64::from(a) - f64::from(b)).powi(2))
                .sum();
            (-distance / sigma2).exp()
        }));

        let graph = if n > 1 {
            KNearestGraph {
                k: FEATURE_GRAPH_NEIGHBORS.min(n - 1),
            }
            .graph(&similarity)?
        } else {
            WeightedGraph::new(n)
        };

        let order = breadth_first_order(&graph, sample.root)?;
        Ok(permute_vertices(&graph, &order)?)
    }
}

/// Pattern vectors of training samples computed for one graph size and
/// eigenvector count, with the model trained on them
#[derive(Debug, Clone)]
struct TrainedPatterns {
    max_graph_size: usize,
    eigenvectors: usize,
    model: KNearestModel,
}

/// Classifies segmentation graphs by their pattern vectors in several
/// feature spaces at once.
///
/// Each feature space gives a k nearest neighbour graph of the segments. The
/// pattern vectors of the graphs of all feature spaces are concatenated and
/// classified by nearest neighbours.
pub struct MultipleGraphsClassifier {
    features: Vec<FeatureSpace>,
    eigenvectors: usize,
    model: KNearestModel,
    training: Vec<Vec<WeightedGraph>>,
    classes: Vec<usize>,
    trained: Option<TrainedPatterns>,
}

impl MultipleGraphsClassifier {
    /// `eigenvectors` is the number of eigenvectors per pattern vector, and
    /// `neighbors` the number of nearest training samples voting on a class.
    pub fn new(features: Vec<FeatureSpace>, eigenvectors: usize, neighbors: usize) -> Result<Self> {
        if features.is_empty() {
            return Err(ClassifyError::InvalidParameter("no feature space".into()));
        }
        if let Some(feature) = features
            .iter()
            .find(|feature| feature.start >= feature.end || !(feature.sigma > 0.0))
        {
            return Err(ClassifyError::InvalidParameter(format!(
                "invalid feature space {feature:?}"
            )));
        }
        if eigenvectors == 0 || neighbors == 0 {
            return Err(ClassifyError::InvalidParameter(
                "eigenvector and neighbour counts must be positive".into(),
            ));
        }

        Ok(Self {
            features,
            eigenvectors,
            model: KNearestModel::new(neighbors),
            training: Vec::new(),
            classes: Vec::new(),
            trained: None,
        })
    }

    pub fn feature_graphs(&self, sample: &RootedGraph) -> Result<Vec<WeightedGraph>> {
        self.features
            .iter()
            .map(|feature| feature.feature_graph(sample))
            .collect()
    }

    /// Concatenated pattern vectors, one row per sample
    fn patterns(
        &self,
        samples: &[Vec<WeightedGraph>],
        eigenvectors: usize,
        max_graph_size: usize,
    ) -> Result<Array2<f64>> {
        let length = max_graph_size * eigenvectors;
        let mut patterns = Array2::zeros((samples.len(), length * self.features.len()));

        for feature in 0..self.features.len() {
            let graphs: Vec<WeightedGraph> = samples
                .iter()
                .map(|graphs| graphs[feature].clone())
                .collect();
            let vectors = pattern_vectors(&graphs, eigenvectors, max_graph_size)?;
            for (row, vector) in vectors.iter().enumerate() {
                patterns
                    .slice_mut(s![row, feature * length..(feature + 1) * length])
                    .assign(vector);
            }
        }

        Ok(patterns)
    }

    fn train_model(&self, eigenvectors: usize, max_graph_size: usize) -> Result<TrainedPatterns> {
        let patterns = self.patterns(&self.training, eigenvectors, max_graph_size)?;
        let mut model = self.model.clone();
        model.train(patterns.view(), &self.classes)?;
        log::debug!(
            "{} training patterns of length {} ({eigenvectors} eigenvectors, graphs up to {max_graph_size} vertices)",
            patterns.nrows(),
            patterns.ncols()
        );
        Ok(TrainedPatterns {
            max_graph_size,
            eigenvectors,
            model,
        })
    }

    fn training_orders(&self) -> (usize, usize) {
        self.training
            .iter()
            .map(|graphs| graphs.first().map_or(0, WeightedGraph::number_of_vertices))
            .fold((usize::MAX, 0), |(min, max), order| (min.min(order), max.max(order)))
    }

    fn eigenvector_count(&self, smallest_order: usize) -> usize {
        self.eigenvectors.min(smallest_order.saturating_sub(1))
    }
}

impl GraphClassifier for MultipleGraphsClassifier {
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

        self.trained = None;
        self.training = samples
            .iter()
            .map(|sample| self.feature_graphs(sample))
            .collect::<Result<_>>()?;
        self.classes = classes.to_vec();

        let (smallest, largest) = self.training_orders();
        self.trained = Some(self.train_model(self.eigenvector_count(smallest), largest)?);
        Ok(())
    }

    fn predict(&self, sample: &RootedGraph) -> Result<usize> {
        let cached = self.trained.as_ref().ok_or(ClassifyError::NotTrained)?;
        let graphs = self.feature_graphs(sample)?;
        let order = sample.graph.number_of_vertices();

        let (smallest, largest) = self.training_orders();
        let max_graph_size = largest.max(order);
        let eigenvectors = self.eigenvector_count(smallest.min(order));

        let retrained;
        let trained = if cached.max_graph_size == max_graph_size && cached.eigenvectors == eigenvectors {
            cached
        } else {
            retrained = self.train_model(eigenvectors, max_graph_size)?;
            &retrained
        };

        let pattern = self.patterns(&[graphs], eigenvectors, max_graph_size)?;
        trained.model.predict(pattern.row(0))
    }
}
