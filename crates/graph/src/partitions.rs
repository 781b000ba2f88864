use crate::disjoint_set::DisjointSetForest;
use crate::error::{GraphError, Result};
use crate::weighted::WeightedGraph;

/// Fuse partitions of disjoint subgraphs of a graph into a partition of the
/// whole graph.
///
/// `in_subgraph` and `vertex_index` are as returned by
/// [`induced_subgraphs`](crate::induced_subgraphs). Two endpoints of an edge
/// end up together iff they lie in the same subgraph and that subgraph's
/// partition joins them.
pub fn fuse_partitions(
    graph: &WeightedGraph,
    in_subgraph: &[usize],
    vertex_index: &[usize],
    partitions: &mut [DisjointSetForest],
) -> Result<DisjointSetForest> {
    let order = graph.number_of_vertices();
    if in_subgraph.len() != order || vertex_index.len() != order {
        return Err(GraphError::SizeMismatch {
            expected: order,
            actual: in_subgraph.len().min(vertex_index.len()),
        });
    }

    let mut partition = DisjointSetForest::new(order);
    for edge in graph.edges() {
        let subgraph = in_subgraph[edge.source];
        if subgraph != in_subgraph[edge.destination] {
            continue;
        }

        let sub_partition = partitions.get_mut(subgraph).ok_or_else(|| {
            GraphError::InvalidPartition(format!("no partition for subgraph {subgraph}"))
        })?;

        if sub_partition.same_set(vertex_index[edge.source], vertex_index[edge.destination]) {
            partition.union(edge.source, edge.destination);
        }
    }

    Ok(partition)
}

/// Remove isolated vertices, typically background pixels, from a graph.
///
/// Expects a bidirectional representation, so that a vertex is isolated iff
/// its adjacency list is empty. Returns the reduced graph and, for each
/// vertex of the input graph, its index in the reduced graph or `None` if it
/// was removed.
pub fn remove_isolated_vertices(graph: &WeightedGraph) -> (WeightedGraph, Vec<Option<usize>>) {
    let mut kept = 0usize;
    let vertex_map: Vec<Option<usize>> = (0..graph.number_of_vertices())
        .map(|vertex| {
            if graph.adjacency_list(vertex).is_empty() {
                None
            } else {
                kept += 1;
                Some(kept - 1)
            }
        })
        .collect();

    let mut connected = WeightedGraph::new(kept);
    for edge in graph.edges() {
        if let (Some(source), Some(destination)) =
            (vertex_map[edge.source], vertex_map[edge.destination])
        {
            connected.add_edge(source, destination, edge.weight);
        }
    }

    log::debug!(
        "removed {} isolated vertices out of {}",
        graph.number_of_vertices() - kept,
        graph.number_of_vertices()
    );

    (connected, vertex_map)
}

/// Undo [`remove_isolated_vertices`] on a segmentation of the reduced graph.
///
/// The segmentation is reproduced on `graph` and every removed vertex is
/// fused into a single background segment.
pub fn add_isolated_vertices(
    graph: &WeightedGraph,
    segmentation: &mut DisjointSetForest,
    vertex_map: &[Option<usize>],
) -> Result<DisjointSetForest> {
    if vertex_map.len() != graph.number_of_vertices() {
        return Err(GraphError::SizeMismatch {
            expected: graph.number_of_vertices(),
            actual: vertex_map.len(),
        });
    }

    let mut result = DisjointSetForest::new(graph.number_of_vertices());
    for edge in graph.edges() {
        if let (Some(source), Some(destination)) =
            (vertex_map[edge.source], vertex_map[edge.destination])
        {
            if segmentation.same_set(source, destination) {
                result.union(edge.source, edge.destination);
            }
        }
    }

    let mut isolated = vertex_map
        .iter()
        .enumerate()
        .filter(|(_, mapped)| mapped.is_none())
        .map(|(vertex, _)| vertex);
    if let Some(first) = isolated.next() {
        for vertex in isolated {
            result.union(first, vertex);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighted::induced_subgraphs;

    fn bidirectional_path(order: usize, edges: &[(usize, usize)]) -> WeightedGraph {
        let mut graph = WeightedGraph::new(order);
        for &(a, b) in edges {
            graph.add_edge(a, b, 1.0);
            graph.add_edge(b, a, 1.0);
        }
        graph
    }

    #[test]
    fn test_fuse_partitions() {
        let graph = bidirectional_path(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let in_subgraph = vec![0, 0, 0, 1, 1];
        let (vertex_index, _) = induced_subgraphs(&graph, &in_subgraph, 2).unwrap();

        let mut first = DisjointSetForest::new(3);
        first.union(0, 1);
        let mut second = DisjointSetForest::new(2);
        second.union(0, 1);

        let mut partition =
            fuse_partitions(&graph, &in_subgraph, &vertex_index, &mut [first, second]).unwrap();
        assert_eq!(partition.number_of_components(), 3);
        assert!(partition.same_set(0, 1));
        assert!(!partition.same_set(1, 2));
        assert!(partition.same_set(3, 4));
        assert!(!partition.same_set(2, 3));
    }

    #[test]
    fn test_remove_then_add_isolated_vertices() {
        let graph = bidirectional_path(6, &[(1, 2), (2, 4)]);
        let (reduced, vertex_map) = remove_isolated_vertices(&graph);

        assert_eq!(reduced.number_of_vertices(), 3);
        assert_eq!(reduced.number_of_edges(), 4);
        assert_eq!(
            vertex_map,
            vec![None, Some(0), Some(1), None, Some(2), None]
        );

        let mut segmentation = DisjointSetForest::new(3);
        segmentation.union(0, 1);

        let mut full = add_isolated_vertices(&graph, &mut segmentation, &vertex_map).unwrap();
        assert_eq!(full.number_of_components(), 3);
        assert!(full.same_set(1, 2));
        assert!(!full.same_set(2, 4));
        assert!(full.same_set(0, 3));
        assert!(full.same_set(3, 5));
    }
}
