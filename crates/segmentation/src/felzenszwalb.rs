use crate::error::{Result, SegmentationError};
use aci_graph::{DisjointSetForest, Edge, WeightedGraph};
use serde::{Deserialize, Serialize};

/// Measure of a component in the merge threshold `Int(C) + k / |C|`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    /// Number of vertices
    #[default]
    Cardinal,
    /// Sum of the weighted degrees of the vertices
    Volume,
}

/// Segment a graph with Felzenszwalb and Huttenlocher's method.
///
/// Edges are visited by increasing weight (ties in insertion order). The
/// components of an edge are merged when its weight is at most
/// `min(Int(C1) + k / |C1|, Int(C2) + k / |C2|)`, where `Int(C)` is the
/// largest weight in the minimum spanning tree of `C`. Components of at
/// most `min_comp_size` vertices are then fused along the edges, in the same
/// order.
pub fn felzenszwalb_segment(
    k: f64,
    graph: &WeightedGraph,
    min_comp_size: usize,
    scale_type: ScaleType,
) -> DisjointSetForest {
    let n = graph.number_of_vertices();
    let mut edges: Vec<Edge> = graph.edges().to_vec();
    edges.sort_by(|a, b| a.weight.total_cmp(&b.weight));

    let mut segmentation = DisjointSetForest::new(n);
    let mut internal_difference = vec![0.0f64; n];
    let mut volume: Vec<f64> = match scale_type {
        ScaleType::Cardinal => Vec::new(),
        ScaleType::Volume => (0..n).map(|vertex| graph.out_degree(vertex)).collect(),
    };

    let threshold = |segmentation: &DisjointSetForest, volume: &[f64], root: usize| -> f64 {
        let measure = match scale_type {
            ScaleType::Cardinal => segmentation.component_size(root) as f64,
            ScaleType::Volume => volume[root],
        };
        // zero volume components only hold zero weight edges
        if measure > 0.0 {
            k / measure
        } else {
            k
        }
    };

    for edge in &edges {
        let root1 = segmentation.find(edge.source);
        let root2 = segmentation.find(edge.destination);
        if root1 == root2 {
            continue;
        }

        let weight = f64::from(edge.weight);
        let merge_threshold = (internal_difference[root1]
            + threshold(&segmentation, &volume, root1))
        .min(internal_difference[root2] + threshold(&segmentation, &volume, root2));

        if weight <= merge_threshold {
            let root = segmentation.union(root1, root2);
            internal_difference[root] = weight;
            if scale_type == ScaleType::Volume {
                volume[root] = volume[root1] + volume[root2];
            }
        }
    }

    for edge in &edges {
        let source = segmentation.find(edge.source);
        let destination = segmentation.find(edge.destination);

        if source != destination
            && (segmentation.component_size(source) <= min_comp_size
                || segmentation.component_size(destination) <= min_comp_size)
        {
            segmentation.union(source, destination);
        }
    }

    log::debug!(
        "felzenszwalb segmentation with k = {k}: {} components",
        segmentation.number_of_components()
    );
    segmentation
}

/// Join neighbouring vertices of a graph iff every segmentation puts them
/// in the same component. Weights are ignored.
pub fn combine_segmentations(
    graph: &WeightedGraph,
    segmentations: &mut [DisjointSetForest],
) -> Result<DisjointSetForest> {
    let n = graph.number_of_vertices();
    if let Some(wrong) = segmentations
        .iter()
        .find(|segmentation| segmentation.number_of_elements() != n)
    {
        return Err(SegmentationError::InvalidParameter(format!(
            "segmentation of {} elements for a graph of {n} vertices",
            wrong.number_of_elements()
        )));
    }

    let mut combination = DisjointSetForest::new(n);
    for edge in graph.edges() {
        if segmentations
            .iter_mut()
            .all(|segmentation| segmentation.same_set(edge.source, edge.destination))
        {
            combination.union(edge.source, edge.destination);
        }
    }

    Ok(combination)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Path 0 - 1 - 2 - 3 - 4 - 5 with a heavy edge in the middle
    fn two_plateaus() -> WeightedGraph {
        let mut graph = WeightedGraph::new(6);
        graph.add_edge(0, 1, 1.0);
        graph.add_edge(1, 2, 1.0);
        graph.add_edge(2, 3, 50.0);
        graph.add_edge(3, 4, 1.0);
        graph.add_edge(4, 5, 1.0);
        graph
    }

    #[test]
    fn test_splits_on_heavy_edge() {
        let mut segmentation = felzenszwalb_segment(3.0, &two_plateaus(), 0, ScaleType::Cardinal);
        assert_eq!(segmentation.number_of_components(), 2);
        assert!(segmentation.same_set(0, 2));
        assert!(segmentation.same_set(3, 5));
        assert!(!segmentation.same_set(2, 3));
    }

    #[test]
    fn test_large_scale_merges_everything() {
        let segmentation = felzenszwalb_segment(1000.0, &two_plateaus(), 0, ScaleType::Cardinal);
        assert_eq!(segmentation.number_of_components(), 1);
    }

    #[test]
    fn test_small_components_are_fused() {
        let mut graph = two_plateaus();
        graph.add_edge(5, 5, 0.0);
        let segmentation = felzenszwalb_segment(0.5, &graph, 0, ScaleType::Cardinal);
        assert_eq!(segmentation.number_of_components(), 6);

        let fused = felzenszwalb_segment(0.5, &graph, 3, ScaleType::Cardinal);
        assert_eq!(fused.number_of_components(), 1);
    }

    #[test]
    fn test_volume_scale() {
        let mut segmentation = felzenszwalb_segment(3.0, &two_plateaus(), 0, ScaleType::Volume);
        // the heavy edge gives vertex 2 a large volume, hence a low threshold
        assert!(!segmentation.same_set(2, 3));
        assert!(segmentation.same_set(0, 1));
    }

    #[test]
    fn test_combine_segmentations() {
        let graph = two_plateaus();
        let first = DisjointSetForest::from_labels(&[0, 0, 0, 1, 1, 1]);
        let second = DisjointSetForest::from_labels(&[0, 0, 1, 1, 1, 2]);
        let mut combined =
            combine_segmentations(&graph, &mut [first.clone(), second]).unwrap();

        assert_eq!(combined.number_of_components(), 4);
        assert!(combined.same_set(0, 1));
        assert!(combined.same_set(3, 4));
        assert!(!combined.same_set(1, 2));
        assert!(!combined.same_set(4, 5));

        assert!(combine_segmentations(&WeightedGraph::new(2), &mut [first]).is_err());
    }
}
