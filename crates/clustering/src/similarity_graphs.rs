use crate::error::{ClusteringError, Result};
use crate::similarity::{MaskedSimilarityMatrix, SimilarityMatrix};
use aci_graph::WeightedGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Turns a similarity matrix into a similarity graph.
///
/// Produced graphs store each undirected edge once.
pub trait SimilarityGraphRepresentation {
    fn graph(&self, similarity: &dyn SimilarityMatrix) -> Result<WeightedGraph>;
}

/// For each sample, the `k` other samples with the highest similarity,
/// most similar first. Ties go to the lowest index.
pub fn similarity_knn(similarity: &dyn SimilarityMatrix, k: usize) -> Result<Vec<Vec<usize>>> {
    let rows = similarity.rows();
    if k >= rows {
        return Err(ClusteringError::InvalidNeighborCount { k, rows });
    }

    Ok((0..rows)
        .map(|i| {
            let mut others: Vec<usize> = (0..rows).filter(|&j| j != i).collect();
            others.sort_by(|&a, &b| similarity.get(i, b).total_cmp(&similarity.get(i, a)));
            others.truncate(k);
            others
        })
        .collect())
}

/// Unit edge between samples whose similarity value is at most `radius`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodGraph {
    pub radius: f64,
}

impl SimilarityGraphRepresentation for NeighborhoodGraph {
    fn graph(&self, similarity: &dyn SimilarityMatrix) -> Result<WeightedGraph> {
        let rows = similarity.rows();
        let mut graph = WeightedGraph::new(rows);
        for i in 0..rows {
            for j in i + 1..rows {
                if similarity.get(i, j) <= self.radius {
                    graph.add_edge(i, j, 1.0);
                }
            }
        }
        Ok(graph)
    }
}

/// Edge between two samples when either is among the `k` most similar to
/// the other, weighted by their similarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KNearestGraph {
    pub k: usize,
}

impl SimilarityGraphRepresentation for KNearestGraph {
    fn graph(&self, similarity: &dyn SimilarityMatrix) -> Result<WeightedGraph> {
        let neighbors = similarity_knn(similarity, self.k)?;
        let mut graph = WeightedGraph::with_max_degree(similarity.rows(), self.k);
        let mut added = HashSet::new();

        for (i, nearest) in neighbors.iter().enumerate() {
            for &neighbor in nearest {
                if added.insert((i.min(neighbor), i.max(neighbor))) {
                    graph.add_edge(i, neighbor, similarity.get(i, neighbor) as f32);
                }
            }
        }

        Ok(graph)
    }
}

/// Edge between two samples when each is among the `k` most similar to the
/// other, weighted by their similarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutualKNearestGraph {
    pub k: usize,
}

impl SimilarityGraphRepresentation for MutualKNearestGraph {
    fn graph(&self, similarity: &dyn SimilarityMatrix) -> Result<WeightedGraph> {
        let neighbors = similarity_knn(similarity, self.k)?;
        let mut graph = WeightedGraph::with_max_degree(similarity.rows(), self.k);

        for (i, nearest) in neighbors.iter().enumerate() {
            for &neighbor in nearest {
                if i < neighbor && neighbors[neighbor].contains(&i) {
                    graph.add_edge(i, neighbor, similarity.get(i, neighbor) as f32);
                }
            }
        }

        Ok(graph)
    }
}

/// Every pair of samples, weighted by their similarity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompleteGraph;

impl SimilarityGraphRepresentation for CompleteGraph {
    fn graph(&self, similarity: &dyn SimilarityMatrix) -> Result<WeightedGraph> {
        let rows = similarity.rows();
        let mut graph = WeightedGraph::with_max_degree(rows, rows.saturating_sub(1));
        for i in 0..rows {
            for j in i + 1..rows {
                graph.add_edge(i, j, similarity.get(i, j) as f32);
            }
        }
        Ok(graph)
    }
}

/// Applies an inner representation to the samples selected by a mask.
///
/// The resulting graph has one vertex per selected sample, in index order.
pub struct MaskedGraph {
    mask: Vec<bool>,
    inner: Box<dyn SimilarityGraphRepresentation>,
}

impl MaskedGraph {
    pub fn new(mask: Vec<bool>, inner: Box<dyn SimilarityGraphRepresentation>) -> Self {
        Self { mask, inner }
    }
}

impl SimilarityGraphRepresentation for MaskedGraph {
    fn graph(&self, similarity: &dyn SimilarityMatrix) -> Result<WeightedGraph> {
        if self.mask.len() != similarity.rows() {
            return Err(ClusteringError::SizeMismatch {
                expected: similarity.rows(),
                actual: self.mask.len(),
            });
        }

        let masked = MaskedSimilarityMatrix::from_mask(similarity, &self.mask);
        log::debug!(
            "masked similarity graph over {} of {} samples",
            masked.rows(),
            similarity.rows()
        );
        self.inner.graph(&masked)
    }
}
