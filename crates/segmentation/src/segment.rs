use crate::attributes::Labeling;
use crate::error::{Result, SegmentationError};
use crate::felzenszwalb::{felzenszwalb_segment, ScaleType};
use crate::image::{check_image, count_foreground, linear_mask, to_row_major, FloatImage, Mask, RgbImage};
use crate::image_graphs::{constant_one, euclidean_distance, grid_graph, Connectivity};
use crate::segmentation_graph::segmentation_graph;
use aci_graph::{
    induced_subgraphs, largest_connected_component, DisjointSetForest, LabeledGraph, WeightedGraph,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Segments of a manual segmentation smaller than this are fused with a neighbour
const MIN_MANUAL_SEGMENT_SIZE: usize = 25;

/// Parameters of [`segment`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// Felzenszwalb scale `k`
    pub scale: f64,
    /// Segments smaller than `foreground / max_segments` pixels are fused
    pub max_segments: usize,
    pub connectivity: Connectivity,
    pub scale_type: ScaleType,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            scale: 300.0,
            max_segments: 20,
            connectivity: Connectivity::Four,
            scale_type: ScaleType::Cardinal,
        }
    }
}

/// Segmentation of an image along with its segmentation graph
#[derive(Debug, Clone)]
pub struct SegmentedImage {
    /// Segmentation of the pixels in row-major order
    pub segmentation: DisjointSetForest,
    /// Largest connected component of the segmentation graph, bidirectional
    pub graph: WeightedGraph,
    /// Segment of each vertex of `graph`, as in [`DisjointSetForest::root_indexes`]
    pub segments: Vec<usize>,
}

impl SegmentedImage {
    /// Segmentation graph labeled by a segment labeling
    pub fn labeled_graph(
        &self,
        image: &FloatImage,
        mask: &Mask,
        labeling: &dyn Labeling,
    ) -> Result<LabeledGraph<Vec<f32>>> {
        let mut graph = LabeledGraph::from_graph(self.graph.clone());
        labeling.label_graph(image, mask, &self.segmentation, &mut graph, &self.segments)?;
        Ok(graph)
    }
}

/// Segment the foreground of an image with Felzenszwalb's method on its
/// grid graph weighted by color distance, and build the segmentation graph.
///
/// Background pixels are isolated in the grid graph, so they end up in
/// singleton segments. Those are left out of the segmentation graph before
/// its largest connected component is taken.
pub fn segment(image: &FloatImage, mask: &Mask, params: &SegmentationParams) -> Result<SegmentedImage> {
    check_image(image, mask)?;
    let foreground = count_foreground(mask);
    if foreground == 0 {
        return Err(SegmentationError::EmptyMask);
    }
    if params.max_segments == 0 {
        return Err(SegmentationError::InvalidParameter(
            "max_segments must be positive".into(),
        ));
    }

    let grid = grid_graph(image, params.connectivity, mask, euclidean_distance, false)?;
    let min_comp_size = foreground / params.max_segments;
    let segmentation = felzenszwalb_segment(params.scale, &grid, min_comp_size, params.scale_type);

    let full_graph: LabeledGraph<()> = segmentation_graph(&segmentation, &grid)?;
    let (graph, segments) = largest_foreground_component(&segmentation, mask, full_graph.graph())?;

    log::debug!(
        "segmented {foreground} pixels into {} segments, {} in the main component",
        segmentation.number_of_components(),
        graph.number_of_vertices()
    );

    Ok(SegmentedImage {
        segmentation,
        graph,
        segments,
    })
}

/// Largest connected component among the segments holding foreground
/// pixels, with the segment of each of its vertices.
fn largest_foreground_component(
    segmentation: &DisjointSetForest,
    mask: &Mask,
    graph: &WeightedGraph,
) -> Result<(WeightedGraph, Vec<usize>)> {
    let segment_of = segmentation.segment_indexes();
    let mut in_foreground = vec![false; graph.number_of_vertices()];
    for (pixel, foreground) in linear_mask(mask).into_iter().enumerate() {
        if foreground {
            in_foreground[segment_of[pixel]] = true;
        }
    }

    // subgraph 0 holds the foreground segments, 1 the background ones
    let in_subgraph: Vec<usize> = in_foreground.iter().map(|&foreground| usize::from(!foreground)).collect();
    let (vertex_index, mut subgraphs) = induced_subgraphs(graph, &in_subgraph, 2)?;
    let foreground_graph = subgraphs.swap_remove(0);

    let mut foreground_segments = vec![0usize; foreground_graph.number_of_vertices()];
    for (segment, (&subgraph, &index)) in in_subgraph.iter().zip(&vertex_index).enumerate() {
        if subgraph == 0 {
            foreground_segments[index] = segment;
        }
    }

    let (component, vertices) = largest_connected_component(&foreground_graph)?;
    let segments = vertices.into_iter().map(|vertex| foreground_segments[vertex]).collect();
    Ok((component, segments))
}

/// Convert a manual segmentation image, where each segment has its own
/// color, into a segmentation.
///
/// Same-colored foreground pixels are joined, segments of less than 25
/// pixels are fused along 4-neighbours, and background pixels are joined
/// into one segment with the extra element `rows * cols`.
pub fn segmentation_image_to_segmentation(image: &RgbImage, mask: &Mask) -> Result<DisjointSetForest> {
    check_image(image, mask)?;
    let (rows, cols, _) = image.dim();
    let background = rows * cols;
    let mut segmentation = DisjointSetForest::new(rows * cols + 1);
    let mut representative: HashMap<[u8; 3], usize> = HashMap::new();

    for i in 0..rows {
        for j in 0..cols {
            if !mask[[i, j]] {
                continue;
            }
            let color = [image[[i, j, 0]], image[[i, j, 1]], image[[i, j, 2]]];
            let index = to_row_major(cols, j, i);
            match representative.get(&color) {
                Some(&first) => {
                    segmentation.union(first, index);
                }
                None => {
                    representative.insert(color, index);
                }
            }
        }
    }

    let grid = grid_graph(image, Connectivity::Four, mask, constant_one, false)?;
    let mut fusion_mask = linear_mask(mask);
    fusion_mask.push(false);
    segmentation.fuse_small_components(&grid, MIN_MANUAL_SEGMENT_SIZE - 1, Some(&fusion_mask));

    for (index, &foreground) in fusion_mask.iter().take(background).enumerate() {
        if !foreground {
            segmentation.union(background, index);
        }
    }

    Ok(segmentation)
}

/// Paint each pixel with the color of its segment's root pixel. Pixels whose
/// root is not a pixel (the background element) are black.
pub fn region_image(image: &RgbImage, segmentation: &DisjointSetForest) -> Result<RgbImage> {
    let (rows, cols, channels) = image.dim();
    if segmentation.number_of_elements() < rows * cols {
        return Err(SegmentationError::InvalidParameter(format!(
            "segmentation of {} elements for {rows}x{cols} pixels",
            segmentation.number_of_elements()
        )));
    }

    let mut regions = RgbImage::zeros((rows, cols, channels));
    for i in 0..rows {
        for j in 0..cols {
            let root = segmentation.root(to_row_major(cols, j, i));
            if root < rows * cols {
                let (root_row, root_col) = (root / cols, root % cols);
                for c in 0..channels {
                    regions[[i, j, c]] = image[[root_row, root_col, c]];
                }
            }
        }
    }

    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AverageColorLabeling;
    use crate::image::full_mask;
    use ndarray::Array3;

    /// Left half black, right half white
    fn halves(rows: usize, cols: usize) -> FloatImage {
        Array3::from_shape_fn((rows, cols, 3), |(_, j, _)| if j < cols / 2 { 0.0 } else { 100.0 })
    }

    #[test]
    fn test_segment_two_halves() {
        let image = halves(6, 8);
        let mask = full_mask(6, 8);
        let params = SegmentationParams {
            scale: 10.0,
            max_segments: 100,
            ..Default::default()
        };
        let segmented = segment(&image, &mask, &params).unwrap();

        assert_eq!(segmented.segmentation.number_of_components(), 2);
        assert_eq!(segmented.graph.number_of_vertices(), 2);
        assert_eq!(segmented.graph.number_of_edges(), 2);

        let labeled = segmented
            .labeled_graph(&image, &mask, &AverageColorLabeling)
            .unwrap();
        assert!(labeled.is_fully_labeled());
    }

    #[test]
    fn test_segment_keeps_largest_component() {
        let image = halves(4, 4);
        let mut mask = full_mask(4, 4);
        // isolate pixel (0, 3) from the rest of the foreground
        mask[[0, 2]] = false;
        mask[[1, 3]] = false;
        let params = SegmentationParams {
            scale: 10.0,
            max_segments: 100,
            ..Default::default()
        };
        let segmented = segment(&image, &mask, &params).unwrap();

        assert!(segmented.graph.is_connected());
        assert!(segmented.segments.len() < segmented.segmentation.number_of_components());
    }

    #[test]
    fn test_uniform_character_with_background_corner() {
        let image = Array3::from_elem((5, 5, 3), 50.0);
        let mut mask = full_mask(5, 5);
        mask[[0, 0]] = false;
        let segmented = segment(&image, &mask, &SegmentationParams::default()).unwrap();

        let foreground_segment = segmented.segmentation.segment_indexes()[1];
        assert_eq!(segmented.graph.number_of_vertices(), 1);
        assert_eq!(segmented.segments, vec![foreground_segment]);

        let labeled = segmented
            .labeled_graph(&image, &mask, &AverageColorLabeling)
            .unwrap();
        assert_eq!(labeled.label(0), Some(&vec![50.0, 50.0, 50.0]));
    }

    #[test]
    fn test_segment_errors() {
        let image = halves(2, 2);
        let empty = Mask::from_elem((2, 2), false);
        assert!(matches!(
            segment(&image, &empty, &SegmentationParams::default()),
            Err(SegmentationError::EmptyMask)
        ));
        assert!(segment(&image, &full_mask(3, 2), &SegmentationParams::default()).is_err());
    }

    #[test]
    fn test_segmentation_image_to_segmentation() {
        // 10x10: left 5 columns red, right 5 columns blue, bottom row background
        let image = RgbImage::from_shape_fn((10, 10, 3), |(_, j, c)| match (j < 5, c) {
            (true, 0) | (false, 2) => 255,
            _ => 0,
        });
        let mut mask = full_mask(10, 10);
        for j in 0..10 {
            mask[[9, j]] = false;
        }
        // a stray green pixel in the red region gets fused with it
        let mut image = image;
        image[[0, 0, 0]] = 0;
        image[[0, 0, 1]] = 255;

        let mut segmentation = segmentation_image_to_segmentation(&image, &mask).unwrap();
        assert_eq!(segmentation.number_of_elements(), 101);
        // red, blue and background
        assert_eq!(segmentation.number_of_components(), 3);
        assert!(segmentation.same_set(0, 1));
        assert!(segmentation.same_set(95, 100));
        assert!(!segmentation.same_set(4, 5));
    }

    #[test]
    fn test_region_image() {
        let image = RgbImage::from_shape_fn((1, 3, 3), |(_, j, _)| (j * 10) as u8);
        let segmentation = DisjointSetForest::from_labels(&[0, 0, 1]);
        let regions = region_image(&image, &segmentation).unwrap();
        assert_eq!(regions[[0, 1, 0]], 0);
        assert_eq!(regions[[0, 2, 0]], 20);

        assert!(region_image(&image, &DisjointSetForest::new(2)).is_err());
    }
}
