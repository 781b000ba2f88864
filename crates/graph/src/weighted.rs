use crate::disjoint_set::DisjointSetForest;
use crate::error::{GraphError, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Full edge as stored in the flat edge list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub destination: usize,
    pub weight: f32,
}

/// Edge as stored in the adjacency list of its source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalfEdge {
    pub destination: usize,
    pub weight: f32,
}

/// Weighted graph stored as adjacency lists.
///
/// Lists are plain vectors: graphs built from images have a small bounded
/// degree. Every added edge is also appended to a flat edge list, in
/// insertion order.
///
/// An undirected graph may be stored either with each edge once
/// ("unidirectional") or with both directions ("bidirectional"). Algorithms
/// document which representation they expect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedGraph {
    adjacency: Vec<Vec<HalfEdge>>,
    edges: Vec<Edge>,
}

impl WeightedGraph {
    pub fn new(number_of_vertices: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); number_of_vertices],
            edges: Vec::new(),
        }
    }

    /// Create a graph reserving room for `max_degree` edges per vertex
    pub fn with_max_degree(number_of_vertices: usize, max_degree: usize) -> Self {
        Self {
            adjacency: (0..number_of_vertices)
                .map(|_| Vec::with_capacity(max_degree))
                .collect(),
            edges: Vec::with_capacity(number_of_vertices * max_degree),
        }
    }

    /// Add an edge from `source` to `destination`.
    ///
    /// # Panics
    ///
    /// Panics if either vertex is out of range. Use [`try_add_edge`](Self::try_add_edge)
    /// for untrusted input.
    pub fn add_edge(&mut self, source: usize, destination: usize, weight: f32) {
        if let Err(err) = self.try_add_edge(source, destination, weight) {
            panic!("{err}");
        }
    }

    pub fn try_add_edge(&mut self, source: usize, destination: usize, weight: f32) -> Result<()> {
        let order = self.number_of_vertices();
        for vertex in [source, destination] {
            if vertex >= order {
                return Err(GraphError::VertexOutOfRange { vertex, order });
            }
        }

        self.adjacency[source].push(HalfEdge {
            destination,
            weight,
        });
        self.edges.push(Edge {
            source,
            destination,
            weight,
        });
        Ok(())
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn adjacency_list(&self, vertex: usize) -> &[HalfEdge] {
        &self.adjacency[vertex]
    }

    pub fn number_of_vertices(&self) -> usize {
        self.adjacency.len()
    }

    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Sum of weights on the adjacency list of a vertex
    pub fn out_degree(&self, vertex: usize) -> f64 {
        self.adjacency[vertex]
            .iter()
            .map(|edge| f64::from(edge.weight))
            .sum()
    }

    /// Convert to an undirected petgraph graph. Node weights are the vertex
    /// indexes; each unordered vertex pair appears at most once, keeping the
    /// first weight encountered. Works for both edge representations.
    pub fn to_petgraph(&self) -> UnGraph<usize, f32> {
        let mut graph = UnGraph::with_capacity(self.number_of_vertices(), self.edges.len());
        for vertex in 0..self.number_of_vertices() {
            graph.add_node(vertex);
        }

        let mut seen = HashSet::new();
        for edge in &self.edges {
            let key = (
                edge.source.min(edge.destination),
                edge.source.max(edge.destination),
            );
            if seen.insert(key) {
                graph.add_edge(
                    NodeIndex::new(edge.source),
                    NodeIndex::new(edge.destination),
                    edge.weight,
                );
            }
        }

        graph
    }

    /// Whether the graph has a single connected component
    pub fn is_connected(&self) -> bool {
        self.number_of_vertices() <= 1
            || petgraph::algo::connected_components(&self.to_petgraph()) == 1
    }
}

/// Compute the connected components of a graph.
///
/// Returns the component of each vertex and the number of components.
/// Components are numbered by order of first appearance in vertex order.
pub fn connected_components(graph: &WeightedGraph) -> (Vec<usize>, usize) {
    let mut forest = DisjointSetForest::new(graph.number_of_vertices());
    for edge in graph.edges() {
        forest.union(edge.source, edge.destination);
    }

    let labels = forest.component_labels();
    let count = forest.number_of_components();
    (labels, count)
}

/// Split a graph into the subgraphs induced by a partition of its vertices.
///
/// `in_subgraph[v]` is the subgraph of vertex `v`, in `0..count`. Returns the
/// index of each vertex inside its subgraph, and the subgraphs. Only edges
/// with both endpoints in the same subgraph are kept.
pub fn induced_subgraphs(
    graph: &WeightedGraph,
    in_subgraph: &[usize],
    count: usize,
) -> Result<(Vec<usize>, Vec<WeightedGraph>)> {
    if in_subgraph.len() != graph.number_of_vertices() {
        return Err(GraphError::SizeMismatch {
            expected: graph.number_of_vertices(),
            actual: in_subgraph.len(),
        });
    }

    let mut sizes = vec![0usize; count];
    let mut vertex_index = Vec::with_capacity(in_subgraph.len());
    for &subgraph in in_subgraph {
        if subgraph >= count {
            return Err(GraphError::InvalidPartition(format!(
                "subgraph {subgraph} out of range for {count} subgraphs"
            )));
        }
        vertex_index.push(sizes[subgraph]);
        sizes[subgraph] += 1;
    }

    let mut subgraphs: Vec<WeightedGraph> = sizes.into_iter().map(WeightedGraph::new).collect();
    for edge in graph.edges() {
        let subgraph = in_subgraph[edge.source];
        if subgraph == in_subgraph[edge.destination] {
            subgraphs[subgraph].add_edge(
                vertex_index[edge.source],
                vertex_index[edge.destination],
                edge.weight,
            );
        }
    }

    Ok((vertex_index, subgraphs))
}

/// Subgraph of the largest connected component, with the original index of
/// each of its vertices. Ties keep the first component.
pub fn largest_connected_component(graph: &WeightedGraph) -> Result<(WeightedGraph, Vec<usize>)> {
    let (in_component, count) = connected_components(graph);
    let (vertex_index, mut components) = induced_subgraphs(graph, &in_component, count)?;

    let Some(largest) = components
        .iter()
        .enumerate()
        .rev()
        .max_by_key(|(_, component)| component.number_of_vertices())
        .map(|(index, _)| index)
    else {
        return Ok((WeightedGraph::new(0), Vec::new()));
    };

    let mut original = vec![0usize; components[largest].number_of_vertices()];
    for (vertex, (&component, &index)) in in_component.iter().zip(&vertex_index).enumerate() {
        if component == largest {
            original[index] = vertex;
        }
    }

    Ok((components.swap_remove(largest), original))
}

/// Vertices in breadth first order from `start`, followed by the vertices
/// it does not reach in index order.
pub fn breadth_first_order(graph: &WeightedGraph, start: usize) -> Result<Vec<usize>> {
    let order = graph.number_of_vertices();
    if start >= order {
        return Err(GraphError::VertexOutOfRange { vertex: start, order });
    }

    let undirected = graph.to_petgraph();
    let mut visited = vec![false; order];
    let mut vertices = Vec::with_capacity(order);
    let mut bfs = Bfs::new(&undirected, NodeIndex::new(start));
    while let Some(node) = bfs.next(&undirected) {
        let vertex = undirected[node];
        visited[vertex] = true;
        vertices.push(vertex);
    }
    vertices.extend((0..order).filter(|&vertex| !visited[vertex]));

    Ok(vertices)
}

/// Same graph with vertex `order[i]` renumbered `i`. Edges keep their
/// insertion order.
pub fn permute_vertices(graph: &WeightedGraph, order: &[usize]) -> Result<WeightedGraph> {
    let n = graph.number_of_vertices();
    if order.len() != n {
        return Err(GraphError::SizeMismatch {
            expected: n,
            actual: order.len(),
        });
    }

    let mut position = vec![usize::MAX; n];
    for (index, &vertex) in order.iter().enumerate() {
        if vertex >= n {
            return Err(GraphError::VertexOutOfRange { vertex, order: n });
        }
        if position[vertex] != usize::MAX {
            return Err(GraphError::Other(format!("vertex {vertex} appears twice in the permutation")));
        }
        position[vertex] = index;
    }

    let mut permuted = WeightedGraph::new(n);
    for edge in graph.edges() {
        permuted.add_edge(position[edge.source], position[edge.destination], edge.weight);
    }
    Ok(permuted)
}
