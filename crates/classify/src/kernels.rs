use crate::error::{ClassifyError, Result};
use aci_graph::{LabeledGraph, WeightedGraph};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

fn squared_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (f64::from(x) - f64::from(y)).powi(2))
        .sum()
}

/// Euclidean distance between two labels seen as vectors
pub fn euclid_distance(a: &[f32], b: &[f32]) -> f64 {
    squared_distance(a, b).sqrt()
}

pub fn dot_product_kernel(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum()
}

/// `exp(-mu * |a - b|² / (2 sigma²))`
pub fn gaussian_kernel(mu: f64, sigma: f64, a: &[f32], b: &[f32]) -> f64 {
    (-mu * squared_distance(a, b) / (2.0 * sigma * sigma)).exp()
}

/// Khi² kernel between two histograms, `lambda * exp(-mu * d²)` where
/// `d² = Σ (p - q)² / (p + q)` over the bins not empty in both.
pub fn khi2_kernel(lambda: f64, mu: f64, a: &[f32], b: &[f32]) -> f64 {
    let distance: f64 = a
        .iter()
        .zip(b)
        .map(|(&p, &q)| (f64::from(p), f64::from(q)))
        .filter(|&(p, q)| p + q != 0.0)
        .map(|(p, q)| (p - q).powi(2) / (p + q))
        .sum();
    lambda * (-mu * distance).exp()
}

/// 1 for identical labels, 0 otherwise
pub fn kronecker_kernel(a: &[f32], b: &[f32]) -> f64 {
    if a == b {
        1.0
    } else {
        0.0
    }
}

/// Similarity between the labels of two vertices
pub trait VertexKernel {
    fn evaluate(&self, a: &[f32], b: &[f32]) -> f64;

    /// Dimension the labels must have, when fixed
    fn label_dimension(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DotProductKernel;

impl VertexKernel for DotProductKernel {
    fn evaluate(&self, a: &[f32], b: &[f32]) -> f64 {
        dot_product_kernel(a, b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianKernel {
    pub mu: f64,
    pub sigma: f64,
}

impl VertexKernel for GaussianKernel {
    fn evaluate(&self, a: &[f32], b: &[f32]) -> f64 {
        gaussian_kernel(self.mu, self.sigma, a, b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Khi2Kernel {
    pub lambda: f64,
    pub mu: f64,
}

impl VertexKernel for Khi2Kernel {
    fn evaluate(&self, a: &[f32], b: &[f32]) -> f64 {
        khi2_kernel(self.lambda, self.mu, a, b)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KroneckerKernel;

impl VertexKernel for KroneckerKernel {
    fn evaluate(&self, a: &[f32], b: &[f32]) -> f64 {
        kronecker_kernel(a, b)
    }
}

const COMPOUND_LABEL_DIMENSION: usize = 10;

/// Weighted sum of Gaussian kernels on the color, position and shape blocks
/// of 10 dimensional labels.
///
/// Label layout: color in `0..3`, position in `3..5`, segment index at `5`,
/// shape in `6..10`. With border lengths, the sum is scaled by
/// `border_lengths[i][j]^gamma_b` for the segment indexes `i` and `j` of the
/// two labels.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundGaussianKernel {
    pub alpha_c: f64,
    pub alpha_x: f64,
    pub alpha_s: f64,
    pub mu_c: f64,
    pub mu_x: f64,
    pub mu_s: f64,
    pub gamma_b: f64,
    border_lengths: Option<Array2<f64>>,
}

impl CompoundGaussianKernel {
    pub fn new(alpha_c: f64, alpha_x: f64, alpha_s: f64) -> Self {
        Self {
            alpha_c,
            alpha_x,
            alpha_s,
            mu_c: 50.0,
            mu_x: 50.0,
            mu_s: 20.0,
            gamma_b: 1.0,
            border_lengths: None,
        }
    }

    pub fn with_border_lengths(mut self, border_lengths: Array2<f64>) -> Self {
        self.border_lengths = Some(border_lengths);
        self
    }

    fn border_factor(&self, a: &[f32], b: &[f32]) -> f64 {
        let Some(lengths) = &self.border_lengths else {
            return 1.0;
        };
        let (i, j) = (a[5].max(0.0) as usize, b[5].max(0.0) as usize);
        lengths
            .get((i, j))
            .map_or(0.0, |&length| length.powf(self.gamma_b))
    }
}

impl Default for CompoundGaussianKernel {
    fn default() -> Self {
        Self::new(5.0, 5.0, 5.0)
    }
}

impl VertexKernel for CompoundGaussianKernel {
    fn evaluate(&self, a: &[f32], b: &[f32]) -> f64 {
        let color = (-self.mu_c * squared_distance(&a[0..3], &b[0..3]) / 3.0).exp();
        let position = (-self.mu_x * squared_distance(&a[3..5], &b[3..5]) / 2.0).exp();
        let shape = (-self.mu_s * squared_distance(&a[6..10], &b[6..10]) / 2.0).exp();

        self.border_factor(a, b)
            * (self.alpha_c * color + self.alpha_x * position + self.alpha_s * shape)
    }

    fn label_dimension(&self) -> Option<usize> {
        Some(COMPOUND_LABEL_DIMENSION)
    }
}

/// Basis kernel of the tree-walk kernel on `(L, a, b, area)` labels:
/// `exp(-mu_c * |c1 - c2|²) * exp(-mu_a * |a1 - a2|)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeWalkBasisKernel {
    pub mu_c: f64,
    pub mu_a: f64,
}

impl VertexKernel for TreeWalkBasisKernel {
    fn evaluate(&self, a: &[f32], b: &[f32]) -> f64 {
        let color = squared_distance(&a[0..3], &b[0..3]);
        let area = (f64::from(a[3]) - f64::from(b[3])).abs();
        (-self.mu_c * color).exp() * (-self.mu_a * area).exp()
    }

    fn label_dimension(&self) -> Option<usize> {
        Some(4)
    }
}

/// All labels of a graph, checked against the kernel's label dimension
pub(crate) fn checked_labels<'a, K: VertexKernel + ?Sized>(
    kernel: &K,
    graph: &'a LabeledGraph<Vec<f32>>,
) -> Result<Vec<&'a [f32]>> {
    graph
        .labels()
        .iter()
        .enumerate()
        .map(|(vertex, label)| {
            let label = label.as_deref().ok_or(ClassifyError::UnlabeledVertex(vertex))?;
            match kernel.label_dimension() {
                Some(expected) if label.len() != expected => Err(ClassifyError::LabelDimension {
                    expected,
                    actual: label.len(),
                }),
                _ => Ok(label),
            }
        })
        .collect()
}

/// Same graph, each edge weighted by the kernel between its endpoint labels
pub fn weigh_edges_by_kernel<K: VertexKernel + ?Sized>(
    kernel: &K,
    graph: &LabeledGraph<Vec<f32>>,
) -> Result<WeightedGraph> {
    let labels = checked_labels(kernel, graph)?;
    let mut weighted = WeightedGraph::new(graph.number_of_vertices());
    for edge in graph.edges() {
        let weight = kernel.evaluate(labels[edge.source], labels[edge.destination]);
        weighted.try_add_edge(edge.source, edge.destination, weight as f32)?;
    }
    Ok(weighted)
}
