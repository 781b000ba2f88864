use crate::error::{Result, SegmentationError};
use crate::image::from_row_major;
use aci_graph::{DisjointSetForest, LabeledGraph, WeightedGraph};
use std::collections::HashSet;

/// Graph whose vertices are the segments of a segmentation, adjacent when
/// two of their pixels are neighbours in `grid`.
///
/// Vertices follow [`DisjointSetForest::root_indexes`]. Each adjacent pair
/// gets a unit edge in both directions, and labels are left empty.
pub fn segmentation_graph<T>(
    segmentation: &DisjointSetForest,
    grid: &WeightedGraph,
) -> Result<LabeledGraph<T>> {
    if segmentation.number_of_elements() != grid.number_of_vertices() {
        return Err(SegmentationError::InvalidParameter(format!(
            "segmentation of {} elements for a grid of {} vertices",
            segmentation.number_of_elements(),
            grid.number_of_vertices()
        )));
    }

    let segment = segmentation.segment_indexes();
    let mut graph = LabeledGraph::new(segmentation.number_of_components());
    let mut adjacent = HashSet::new();

    for edge in grid.edges() {
        let source = segment[edge.source];
        let destination = segment[edge.destination];

        if source != destination && adjacent.insert((source.min(destination), source.max(destination))) {
            graph.add_edge(source, destination, 1.0);
            graph.add_edge(destination, source, 1.0);
        }
    }

    Ok(graph)
}

/// Mean `(row, col)` of the pixels of each segment, indexed as in
/// [`DisjointSetForest::root_indexes`]. Only the first `rows * cols`
/// elements are pixels.
pub fn segment_centers(rows: usize, cols: usize, segmentation: &DisjointSetForest) -> Vec<[f32; 2]> {
    let segment = segmentation.segment_indexes();
    let mut sums = vec![[0.0f64; 2]; segmentation.number_of_components()];
    let mut counts = vec![0usize; segmentation.number_of_components()];

    for (index, &segment) in segment.iter().enumerate().take(rows * cols) {
        let (i, j) = from_row_major(cols, index);
        sums[segment][0] += i as f64;
        sums[segment][1] += j as f64;
        counts[segment] += 1;
    }

    sums.iter()
        .zip(&counts)
        .map(|(sum, &count)| {
            if count == 0 {
                [0.0, 0.0]
            } else {
                [(sum[0] / count as f64) as f32, (sum[1] / count as f64) as f32]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{full_mask, RgbImage};
    use crate::image_graphs::{constant_one, grid_graph, Connectivity};
    use pretty_assertions::assert_eq;

    /// 2x3 image split into a left column, and the rest split by rows
    fn three_segments() -> DisjointSetForest {
        DisjointSetForest::from_labels(&[0, 1, 1, 0, 2, 2])
    }

    fn grid() -> WeightedGraph {
        grid_graph(
            &RgbImage::zeros((2, 3, 3)),
            Connectivity::Four,
            &full_mask(2, 3),
            constant_one,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_segmentation_graph_edges() {
        let graph: LabeledGraph<Vec<f32>> = segmentation_graph(&three_segments(), &grid()).unwrap();
        assert_eq!(graph.number_of_vertices(), 3);
        // every pair of segments touches, each pair stored both ways
        assert_eq!(graph.number_of_edges(), 6);
        assert!(graph.labels().iter().all(Option::is_none));
        assert!(graph.edges().iter().all(|edge| edge.weight == 1.0));
    }

    #[test]
    fn test_size_mismatch() {
        let result: Result<LabeledGraph<()>> =
            segmentation_graph(&DisjointSetForest::new(4), &grid());
        assert!(result.is_err());
    }

    #[test]
    fn test_segment_centers() {
        let centers = segment_centers(2, 3, &three_segments());
        assert_eq!(centers, vec![[0.5, 0.0], [0.0, 1.5], [1.0, 1.5]]);
    }
}
