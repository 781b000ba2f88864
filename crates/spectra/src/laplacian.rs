use crate::error::Result;
use crate::sparse::CsrMatrix;
use aci_graph::WeightedGraph;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Unnormalized Laplacian of a graph.
///
/// `L(u,u) = d_u - w(u,u)` and `L(u,v) = -w(u,v)` for adjacent vertices.
/// Expects each undirected edge to be stored once.
pub fn laplacian(graph: &WeightedGraph) -> Array2<f64> {
    let n = graph.number_of_vertices();
    let mut result = Array2::zeros((n, n));

    for edge in graph.edges() {
        let weight = f64::from(edge.weight);
        result[[edge.source, edge.destination]] -= weight;
        result[[edge.source, edge.source]] += weight;

        if edge.source != edge.destination {
            result[[edge.destination, edge.source]] -= weight;
            result[[edge.destination, edge.destination]] += weight;
        }
    }

    result
}

/// Degrees of the vertices, each edge counting for both of its endpoints
fn undirected_degrees(graph: &WeightedGraph) -> Array1<f64> {
    let mut degrees = Array1::zeros(graph.number_of_vertices());
    for edge in graph.edges() {
        degrees[edge.source] += f64::from(edge.weight);
        degrees[edge.destination] += f64::from(edge.weight);
    }
    degrees
}

fn inverse_square_roots(degrees: &Array1<f64>) -> Array1<f64> {
    degrees.mapv(|degree| if degree > 0.0 { 1.0 / degree.sqrt() } else { 0.0 })
}

/// Normalized Laplacian `D^-1/2 L D^-1/2`. Isolated vertices get a zero row
/// and column. Expects each undirected edge to be stored once.
pub fn normalized_laplacian(graph: &WeightedGraph) -> Array2<f64> {
    let mut result = laplacian(graph);
    let scale = inverse_square_roots(&undirected_degrees(graph));

    for ((row, col), value) in result.indexed_iter_mut() {
        *value *= scale[row] * scale[col];
    }

    result
}

/// Sparse unnormalized Laplacian, along with the vertex degrees.
///
/// With a bidirectional representation each edge contributes only to its
/// source row. Self loops subtract their weight from the degree (half of it
/// when bidirectional, as the loop then appears on both passes).
pub fn sparse_laplacian(graph: &WeightedGraph, bidirectional: bool) -> Result<(CsrMatrix, Array1<f64>)> {
    let n = graph.number_of_vertices();
    let mut degrees: Array1<f64> = Array1::zeros(n);
    let mut triplets = Vec::with_capacity(graph.number_of_edges() * 2 + n);

    for edge in graph.edges() {
        let weight = f64::from(edge.weight);

        if edge.source == edge.destination {
            degrees[edge.source] -= if bidirectional { weight / 2.0 } else { weight };
            continue;
        }

        triplets.push((edge.source, edge.destination, -weight));
        degrees[edge.source] += weight;

        if !bidirectional {
            triplets.push((edge.destination, edge.source, -weight));
            degrees[edge.destination] += weight;
        }
    }

    for (vertex, &degree) in degrees.iter().enumerate() {
        triplets.push((vertex, vertex, degree));
    }

    Ok((CsrMatrix::from_triplets(n, n, &triplets)?, degrees))
}

/// Sparse normalized Laplacian `D^-1/2 L D^-1/2`, along with the vertex degrees
pub fn normalized_sparse_laplacian(
    graph: &WeightedGraph,
    bidirectional: bool,
) -> Result<(CsrMatrix, Array1<f64>)> {
    let (mut matrix, degrees) = sparse_laplacian(graph, bidirectional)?;
    let scale = inverse_square_roots(&degrees);
    matrix.scale(&scale, &scale);
    Ok((matrix, degrees))
}

/// Matrix used to represent a graph in spectral methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixRepresentation {
    Laplacian,
    #[default]
    NormalizedLaplacian,
}

impl MatrixRepresentation {
    /// Dense matrix, expecting each undirected edge once
    pub fn dense(&self, graph: &WeightedGraph) -> Array2<f64> {
        match self {
            Self::Laplacian => laplacian(graph),
            Self::NormalizedLaplacian => normalized_laplacian(graph),
        }
    }

    pub fn sparse(&self, graph: &WeightedGraph, bidirectional: bool) -> Result<CsrMatrix> {
        let (matrix, _) = match self {
            Self::Laplacian => sparse_laplacian(graph, bidirectional)?,
            Self::NormalizedLaplacian => normalized_sparse_laplacian(graph, bidirectional)?,
        };
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    fn path() -> WeightedGraph {
        let mut graph = WeightedGraph::new(3);
        graph.add_edge(0, 1, 1.0);
        graph.add_edge(1, 2, 2.0);
        graph
    }

    fn bidirectional_path() -> WeightedGraph {
        let mut graph = WeightedGraph::new(3);
        for edge in path().edges() {
            graph.add_edge(edge.source, edge.destination, edge.weight);
            graph.add_edge(edge.destination, edge.source, edge.weight);
        }
        graph
    }

    #[test]
    fn test_laplacian_of_path() {
        assert_eq!(
            laplacian(&path()),
            array![[1.0, -1.0, 0.0], [-1.0, 3.0, -2.0], [0.0, -2.0, 2.0]]
        );
    }

    #[test]
    fn test_sparse_laplacian_matches_dense() {
        let (sparse, degrees) = sparse_laplacian(&path(), false).unwrap();
        assert_eq!(sparse.to_dense(), laplacian(&path()));
        assert_eq!(degrees, array![1.0, 3.0, 2.0]);

        let (bidirectional, degrees) = sparse_laplacian(&bidirectional_path(), true).unwrap();
        assert_eq!(bidirectional.to_dense(), laplacian(&path()));
        assert_eq!(degrees, array![1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_sparse_laplacian_self_loop() {
        let mut graph = WeightedGraph::new(2);
        graph.add_edge(0, 1, 2.0);
        graph.add_edge(0, 0, 0.5);
        let (sparse, degrees) = sparse_laplacian(&graph, false).unwrap();
        assert_eq!(degrees, array![1.5, 2.0]);
        assert_eq!(sparse.get(0, 0), 1.5);
    }

    #[test]
    fn test_normalized_laplacian_has_unit_diagonal() {
        let normalized = normalized_laplacian(&path());
        for i in 0..3 {
            assert!((normalized[[i, i]] - 1.0).abs() < 1e-12);
        }
        let expected = -2.0 / (3.0f64 * 2.0).sqrt();
        assert!((normalized[[1, 2]] - expected).abs() < 1e-12);

        let (sparse, _) = normalized_sparse_laplacian(&bidirectional_path(), true).unwrap();
        let dense = sparse.to_dense();
        for (a, b) in dense.iter().zip(normalized.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_isolated_vertex_gets_zero_row() {
        let mut graph = WeightedGraph::new(3);
        graph.add_edge(0, 1, 1.0);
        let normalized = normalized_laplacian(&graph);
        assert_eq!(normalized.row(2).sum(), 0.0);
        assert_eq!(normalized.column(2).sum(), 0.0);
    }
}
