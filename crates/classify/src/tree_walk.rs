use crate::error::{ClassifyError, Result};
use crate::kernels::{checked_labels, VertexKernel};
use aci_graph::LabeledGraph;
use ndarray::Array2;

/// Neighbours of each vertex in counter-clockwise order around it, from the
/// vertex positions. Positions are `(row, col)` as returned by segment
/// centers; self loops and duplicate edges are ignored.
pub fn circular_neighbors<T>(graph: &LabeledGraph<T>, positions: &[[f32; 2]]) -> Result<Vec<Vec<usize>>> {
    let n = graph.number_of_vertices();
    if positions.len() != n {
        return Err(ClassifyError::SizeMismatch {
            expected: n,
            actual: positions.len(),
        });
    }

    Ok((0..n)
        .map(|vertex| {
            let [row, col] = positions[vertex];
            let angle = |neighbor: usize| {
                let [neighbor_row, neighbor_col] = positions[neighbor];
                // rows grow downwards
                f64::from(row - neighbor_row).atan2(f64::from(neighbor_col - col))
            };

            let mut neighbors: Vec<usize> = graph
                .adjacency_list(vertex)
                .iter()
                .map(|edge| edge.destination)
                .filter(|&neighbor| neighbor != vertex)
                .collect();
            neighbors.sort_unstable();
            neighbors.dedup();
            neighbors.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)).then(a.cmp(&b)));
            neighbors
        })
        .collect())
}

/// Tree-walk kernel between two planar labeled graphs, stored
/// bidirectionally, with vertex positions giving their planar embedding.
///
/// Depth 0 is the basis kernel matrix between the vertices of both graphs.
/// At each further depth, the kernel between `v1` and `v2` is their basis
/// kernel times the sum, over neighbour interval sizes `1..=arity` and all
/// pairs of circular neighbour intervals of that size, of the product of the
/// previous depth kernels between aligned neighbours. The result sums the
/// kernel matrix of the last depth.
pub fn tree_walk_kernel<K: VertexKernel + ?Sized>(
    kernel: &K,
    depth: usize,
    arity: usize,
    graph1: &LabeledGraph<Vec<f32>>,
    positions1: &[[f32; 2]],
    graph2: &LabeledGraph<Vec<f32>>,
    positions2: &[[f32; 2]],
) -> Result<f64> {
    let labels1 = checked_labels(kernel, graph1)?;
    let labels2 = checked_labels(kernel, graph2)?;
    let neighbors1 = circular_neighbors(graph1, positions1)?;
    let neighbors2 = circular_neighbors(graph2, positions2)?;

    let basis = Array2::from_shape_fn((labels1.len(), labels2.len()), |(v1, v2)| {
        kernel.evaluate(labels1[v1], labels2[v2])
    });

    let mut previous = basis.clone();
    for level in 0..depth {
        let current = Array2::from_shape_fn(basis.dim(), |(v1, v2)| {
            basis[[v1, v2]] * aligned_intervals_sum(&previous, &neighbors1[v1], &neighbors2[v2], arity)
        });
        log::debug!("tree-walk kernel depth {} sum {:.6e}", level + 1, current.sum());
        previous = current;
    }

    Ok(previous.sum())
}

/// Sum over interval sizes and circular intervals of the products of aligned
/// kernel values
fn aligned_intervals_sum(kernels: &Array2<f64>, first: &[usize], second: &[usize], arity: usize) -> f64 {
    let max_size = arity.min(first.len()).min(second.len());
    let mut sum = 0.0;

    for size in 1..=max_size {
        for i in 0..first.len() {
            for j in 0..second.len() {
                sum += (0..size)
                    .map(|offset| {
                        kernels[[first[(i + offset) % first.len()], second[(j + offset) % second.len()]]]
                    })
                    .product::<f64>();
            }
        }
    }

    sum
}
