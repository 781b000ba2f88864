use crate::bipartition::{prefix_bipartition, recursive_partition, sweep_cut, Bipartition};
use crate::error::Result;
use aci_graph::{DisjointSetForest, WeightedGraph};
use aci_spectra::{normalized_sparse_laplacian, symmetric_sparse_eigen_solver, EigenSelection};

/// Normalized cuts (Shi and Malik) of a bidirectional graph.
///
/// Components are split along the sweep of the second smallest eigenvector
/// of the normalized Laplacian, minimizing
/// `cut / assoc(A) + cut / assoc(B)`, for as long as that value is below
/// `stop` and at most `max_recursions` levels deep.
pub fn normalized_cuts(
    graph: &WeightedGraph,
    stop: f64,
    max_recursions: usize,
) -> Result<DisjointSetForest> {
    let forest = recursive_partition(graph, stop, max_recursions, &normalized_cut)?;
    log::debug!("normalized cuts: {} segments", forest.number_of_components());
    Ok(forest)
}

fn normalized_cut(graph: &WeightedGraph) -> Result<Option<Bipartition>> {
    let n = graph.number_of_vertices();
    let degrees: Vec<f64> = (0..n).map(|vertex| graph.out_degree(vertex)).collect();
    if n < 2 || degrees.iter().sum::<f64>() <= 0.0 {
        return Ok(None);
    }

    let (laplacian, _) = normalized_sparse_laplacian(graph, true)?;
    let (_, vectors) = symmetric_sparse_eigen_solver(&laplacian, EigenSelection::SmallestAlgebraic, 2, n)?;

    // back from D^1/2 y to the generalized eigenvector y
    let indicator: Vec<f64> = vectors
        .column(1)
        .iter()
        .zip(&degrees)
        .map(|(&value, &degree)| if degree > 0.0 { value / degree.sqrt() } else { value })
        .collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| indicator[a].total_cmp(&indicator[b]));

    let best = sweep_cut(graph, &order, &degrees, |cut, volume, total| {
        let rest = total - volume;
        (volume > 0.0 && rest > 0.0).then(|| cut / volume + cut / rest)
    });

    Ok(best.map(|(length, ratio)| prefix_bipartition(n, &order, length, ratio)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_squares() -> WeightedGraph {
        // 4-cycles 0-1-2-3 and 4-5-6-7, bridged by a weak 3-4 edge
        let edges = [
            (0, 1, 1.0),
            (1, 2, 1.0),
            (2, 3, 1.0),
            (3, 0, 1.0),
            (4, 5, 1.0),
            (5, 6, 1.0),
            (6, 7, 1.0),
            (7, 4, 1.0),
            (3, 4, 0.05),
        ];
        let mut graph = WeightedGraph::new(8);
        for (a, b, w) in edges {
            graph.add_edge(a, b, w);
            graph.add_edge(b, a, w);
        }
        graph
    }

    #[test]
    fn test_cut_separates_squares() {
        let bipartition = normalized_cut(&two_squares()).unwrap().unwrap();
        let first = bipartition.in_first[0];
        assert!(bipartition.in_first[..4].iter().all(|&side| side == first));
        assert!(bipartition.in_first[4..].iter().all(|&side| side != first));
        assert!(bipartition.ratio < 0.02);
    }

    #[test]
    fn test_normalized_cuts_recursion() {
        let mut forest = normalized_cuts(&two_squares(), 0.5, 10).unwrap();
        assert_eq!(forest.number_of_components(), 2);
        assert!(forest.same_set(0, 2));
        assert!(forest.same_set(5, 7));
        assert!(!forest.same_set(3, 4));

        let whole = normalized_cuts(&two_squares(), 0.5, 0).unwrap();
        assert_eq!(whole.number_of_components(), 1);
    }
}
