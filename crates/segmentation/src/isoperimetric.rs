use crate::bipartition::{prefix_bipartition, recursive_partition, sweep_cut, Bipartition};
use crate::error::Result;
use aci_graph::{DisjointSetForest, WeightedGraph};
use aci_spectra::{conjugate_gradient, sparse_laplacian};
use ndarray::Array1;

const SOLVER_TOLERANCE: f64 = 1e-10;
const MIN_SOLVER_ITERATIONS: usize = 100;

/// Isoperimetric graph partitioning (Grady and Schwartz) of a bidirectional
/// graph.
///
/// Each connected component is cut along the isoperimetric ratio
/// `boundary / volume` of its best sweep cut, and both sides are partitioned
/// again while that ratio stays below `stop`, at most `max_recursions`
/// levels deep.
pub fn isoperimetric_graph_partitioning(
    graph: &WeightedGraph,
    stop: f64,
    max_recursions: usize,
) -> Result<DisjointSetForest> {
    let forest = recursive_partition(graph, stop, max_recursions, &isoperimetric_cut)?;
    log::debug!(
        "isoperimetric partitioning: {} segments",
        forest.number_of_components()
    );
    Ok(forest)
}

/// Best isoperimetric cut of a connected graph with at least two vertices
fn isoperimetric_cut(graph: &WeightedGraph) -> Result<Option<Bipartition>> {
    let n = graph.number_of_vertices();
    let degrees: Vec<f64> = (0..n).map(|vertex| graph.out_degree(vertex)).collect();
    let total: f64 = degrees.iter().sum();
    if n < 2 || total <= 0.0 {
        return Ok(None);
    }

    // ground the first vertex of maximum degree
    let ground = degrees
        .iter()
        .enumerate()
        .fold(0, |best, (vertex, &degree)| if degree > degrees[best] { vertex } else { best });

    let (laplacian, _) = sparse_laplacian(graph, true)?;
    let grounded = laplacian.remove_line_col(ground)?;
    let kept: Vec<usize> = (0..n).filter(|&vertex| vertex != ground).collect();
    let rhs: Array1<f64> = kept.iter().map(|&vertex| degrees[vertex]).collect();

    let solution = conjugate_gradient(
        &grounded,
        rhs.view(),
        None,
        SOLVER_TOLERANCE,
        (10 * n).max(MIN_SOLVER_ITERATIONS),
    )?;
    if !solution.converged {
        log::warn!(
            "isoperimetric solve did not converge after {} iterations, residual {:.3e}",
            solution.iterations,
            solution.residual_norm
        );
    }

    let mut reduced: Vec<usize> = (0..kept.len()).collect();
    reduced.sort_by(|&a, &b| solution.solution[a].total_cmp(&solution.solution[b]));
    let order: Vec<usize> = std::iter::once(ground)
        .chain(reduced.into_iter().map(|index| kept[index]))
        .collect();

    let best = sweep_cut(graph, &order, &degrees, |boundary, volume, total| {
        (volume > 0.0 && volume <= total / 2.0).then(|| boundary / volume)
    });

    Ok(best.map(|(length, ratio)| prefix_bipartition(n, &order, length, ratio)))
}
