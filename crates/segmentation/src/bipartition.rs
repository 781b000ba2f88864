use crate::error::Result;
use aci_graph::{
    connected_components, fuse_partitions, induced_subgraphs, DisjointSetForest, WeightedGraph,
};

/// Cut of a connected graph in two non empty sides
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bipartition {
    /// Whether each vertex is on the first side
    pub in_first: Vec<bool>,
    /// Quality of the cut, lower is better
    pub ratio: f64,
}

/// Forest where all elements are in one set
fn single_segment(order: usize) -> DisjointSetForest {
    let mut forest = DisjointSetForest::new(order);
    for vertex in 1..order {
        forest.union(0, vertex);
    }
    forest
}

/// Recursively partition each connected component of a bidirectional graph.
///
/// A component is cut in two by `cut` when the cut's ratio is below `stop`,
/// and each side is partitioned in turn, at most `max_recursions` levels
/// deep. Otherwise the component is left as one segment.
pub(crate) fn recursive_partition<F>(
    graph: &WeightedGraph,
    stop: f64,
    max_recursions: usize,
    cut: &F,
) -> Result<DisjointSetForest>
where
    F: Fn(&WeightedGraph) -> Result<Option<Bipartition>>,
{
    let (in_component, count) = connected_components(graph);
    if count <= 1 {
        return partition_connected(graph, stop, max_recursions, cut);
    }

    let (vertex_index, components) = induced_subgraphs(graph, &in_component, count)?;
    let mut partitions = components
        .iter()
        .map(|component| partition_connected(component, stop, max_recursions, cut))
        .collect::<Result<Vec<_>>>()?;

    Ok(fuse_partitions(graph, &in_component, &vertex_index, &mut partitions)?)
}

fn partition_connected<F>(
    graph: &WeightedGraph,
    stop: f64,
    max_recursions: usize,
    cut: &F,
) -> Result<DisjointSetForest>
where
    F: Fn(&WeightedGraph) -> Result<Option<Bipartition>>,
{
    let order = graph.number_of_vertices();
    if order <= 1 || max_recursions == 0 {
        return Ok(single_segment(order));
    }

    let bipartition = match cut(graph)? {
        Some(bipartition) if bipartition.ratio < stop => bipartition,
        _ => return Ok(single_segment(order)),
    };

    log::debug!(
        "cut {order} vertices with ratio {:.4}, {} recursions left",
        bipartition.ratio,
        max_recursions - 1
    );

    let sides: Vec<usize> = bipartition
        .in_first
        .iter()
        .map(|&first| if first { 0 } else { 1 })
        .collect();
    let (vertex_index, subgraphs) = induced_subgraphs(graph, &sides, 2)?;
    let mut partitions = subgraphs
        .iter()
        .map(|subgraph| recursive_partition(subgraph, stop, max_recursions - 1, cut))
        .collect::<Result<Vec<_>>>()?;

    Ok(fuse_partitions(graph, &sides, &vertex_index, &mut partitions)?)
}

/// Sweep the vertices in the given order, growing the first side one vertex
/// at a time. Calls `score(boundary, first_volume, total_volume)` for each
/// prefix leaving both sides non empty and returns the best prefix length
/// with its ratio. Volumes are weighted degrees of a bidirectional graph.
pub(crate) fn sweep_cut<S>(
    graph: &WeightedGraph,
    order: &[usize],
    degrees: &[f64],
    score: S,
) -> Option<(usize, f64)>
where
    S: Fn(f64, f64, f64) -> Option<f64>,
{
    let total: f64 = degrees.iter().sum();
    let mut in_first = vec![false; graph.number_of_vertices()];
    let mut boundary = 0.0;
    let mut volume = 0.0;
    let mut best: Option<(usize, f64)> = None;

    for (position, &vertex) in order.iter().enumerate().take(order.len().saturating_sub(1)) {
        let internal: f64 = graph
            .adjacency_list(vertex)
            .iter()
            .filter(|edge| in_first[edge.destination])
            .map(|edge| f64::from(edge.weight))
            .sum();
        boundary += degrees[vertex] - 2.0 * internal;
        volume += degrees[vertex];
        in_first[vertex] = true;

        if let Some(ratio) = score(boundary, volume, total) {
            if best.map_or(true, |(_, best_ratio)| ratio < best_ratio) {
                best = Some((position + 1, ratio));
            }
        }
    }

    best
}

/// Bipartition with the first `length` vertices of `order` on the first side
pub(crate) fn prefix_bipartition(
    number_of_vertices: usize,
    order: &[usize],
    length: usize,
    ratio: f64,
) -> Bipartition {
    let mut in_first = vec![false; number_of_vertices];
    for &vertex in &order[..length] {
        in_first[vertex] = true;
    }
    Bipartition { in_first, ratio }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bidirectional(order: usize, edges: &[(usize, usize, f32)]) -> WeightedGraph {
        let mut graph = WeightedGraph::new(order);
        for &(a, b, w) in edges {
            graph.add_edge(a, b, w);
            graph.add_edge(b, a, w);
        }
        graph
    }

    #[test]
    fn test_sweep_cut_finds_bridge() {
        let graph = bidirectional(4, &[(0, 1, 5.0), (1, 2, 1.0), (2, 3, 5.0)]);
        let degrees: Vec<f64> = (0..4).map(|v| graph.out_degree(v)).collect();
        let best = sweep_cut(&graph, &[0, 1, 2, 3], &degrees, |boundary, volume, _| {
            Some(boundary / volume)
        });
        // prefixes: {0}: 5/5, {0,1}: 1/11, {0,1,2}: 5/17
        let (length, ratio) = best.unwrap();
        assert_eq!(length, 2);
        assert!((ratio - 1.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_recursive_partition_by_components_and_cuts() {
        // an edge and a 3-vertex path, and a cut that always splits off the first vertex
        let graph = bidirectional(5, &[(0, 1, 1.0), (2, 3, 1.0), (3, 4, 1.0)]);
        let cut = |graph: &WeightedGraph| -> Result<Option<Bipartition>> {
            let order: Vec<usize> = (0..graph.number_of_vertices()).collect();
            Ok(Some(prefix_bipartition(order.len(), &order, 1, 0.5)))
        };

        let mut none = recursive_partition(&graph, 0.1, 5, &cut).unwrap();
        assert_eq!(none.number_of_components(), 2);
        assert!(none.same_set(2, 4));

        let mut once = recursive_partition(&graph, 1.0, 1, &cut).unwrap();
        assert_eq!(once.number_of_components(), 4);
        assert!(once.same_set(3, 4));

        let all = recursive_partition(&graph, 1.0, 10, &cut).unwrap();
        assert_eq!(all.number_of_components(), 5);
    }
}
