use crate::weighted::WeightedGraph;
use std::ops::{Deref, DerefMut};

/// Weighted graph with an optional label on each vertex.
///
/// Segmentation graphs carry segment attributes (average color, area,
/// histograms, ...) as labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledGraph<T> {
    graph: WeightedGraph,
    labels: Vec<Option<T>>,
}

impl<T> LabeledGraph<T> {
    pub fn new(number_of_vertices: usize) -> Self {
        Self::from_graph(WeightedGraph::new(number_of_vertices))
    }

    /// Wrap an existing graph, with no labels
    pub fn from_graph(graph: WeightedGraph) -> Self {
        let labels = std::iter::repeat_with(|| None)
            .take(graph.number_of_vertices())
            .collect();
        Self { graph, labels }
    }

    pub fn set_label(&mut self, vertex: usize, label: T) {
        self.labels[vertex] = Some(label);
    }

    pub fn label(&self, vertex: usize) -> Option<&T> {
        self.labels[vertex].as_ref()
    }

    pub fn labels(&self) -> &[Option<T>] {
        &self.labels
    }

    /// Whether every vertex has a label
    pub fn is_fully_labeled(&self) -> bool {
        self.labels.iter().all(Option::is_some)
    }

    /// Copy the edges of another graph of the same order into this one
    pub fn copy_edges(&mut self, other: &WeightedGraph) {
        for edge in other.edges() {
            self.graph.add_edge(edge.source, edge.destination, edge.weight);
        }
    }

    /// Same labels on a different edge set (typically reweighted edges)
    pub fn with_graph(&self, graph: WeightedGraph) -> Self
    where
        T: Clone,
    {
        assert_eq!(graph.number_of_vertices(), self.graph.number_of_vertices());
        Self {
            graph,
            labels: self.labels.clone(),
        }
    }

    pub fn graph(&self) -> &WeightedGraph {
        &self.graph
    }

    pub fn into_parts(self) -> (WeightedGraph, Vec<Option<T>>) {
        (self.graph, self.labels)
    }
}

impl<T> Deref for LabeledGraph<T> {
    type Target = WeightedGraph;

    fn deref(&self) -> &Self::Target {
        &self.graph
    }
}

impl<T> DerefMut for LabeledGraph<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_and_edges() {
        let mut graph: LabeledGraph<Vec<f32>> = LabeledGraph::new(3);
        assert!(!graph.is_fully_labeled());

        graph.set_label(0, vec![1.0]);
        graph.set_label(1, vec![2.0]);
        graph.set_label(2, vec![3.0]);
        graph.add_edge(0, 1, 0.5);

        assert!(graph.is_fully_labeled());
        assert_eq!(graph.label(1), Some(&vec![2.0]));
        assert_eq!(graph.number_of_edges(), 1);
    }

    #[test]
    fn test_copy_edges_and_with_graph() {
        let mut source = WeightedGraph::new(2);
        source.add_edge(0, 1, 2.0);

        let mut graph: LabeledGraph<u8> = LabeledGraph::new(2);
        graph.set_label(0, 7);
        graph.copy_edges(&source);
        assert_eq!(graph.edges(), source.edges());

        let reweighted = graph.with_graph(WeightedGraph::new(2));
        assert_eq!(reweighted.number_of_edges(), 0);
        assert_eq!(reweighted.label(0), Some(&7));
        assert_eq!(reweighted.label(1), None);
    }
}
