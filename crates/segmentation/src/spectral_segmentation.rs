use crate::error::{Result, SegmentationError};
use crate::image::{check_image, count_foreground, linear_mask, pixel, FloatImage, Mask};
use aci_clustering::{spectral_clustering, KNearestGraph, MaskedGraph, SimilarityMatrix};
use aci_graph::DisjointSetForest;
use aci_spectra::MatrixRepresentation;

const COLOR_SIGMA: f64 = 147.0;
const NEAREST_NEIGHBORS: usize = 8;

/// Similarity between the pixels of an image, in row-major order:
/// `exp(-|ci - cj|² / σc²) · exp(-|pi - pj|² / σp²)` with colors `c` and
/// positions `p`.
#[derive(Debug, Clone)]
pub struct PixelSimilarityMatrix {
    colors: Vec<[f64; 3]>,
    cols: usize,
    color_sigma: f64,
    position_sigma: f64,
}

impl PixelSimilarityMatrix {
    /// Color sigma of 147 and position sigma of a third of the image diagonal
    pub fn new(image: &FloatImage) -> Self {
        let (rows, cols, _) = image.dim();
        let diagonal = ((rows * rows + cols * cols) as f64).sqrt();
        Self::with_sigmas(image, COLOR_SIGMA, diagonal / 3.0)
    }

    pub fn with_sigmas(image: &FloatImage, color_sigma: f64, position_sigma: f64) -> Self {
        let (rows, cols, _) = image.dim();
        let colors = (0..rows * cols)
            .map(|index| pixel(image, index / cols, index % cols))
            .collect();
        Self {
            colors,
            cols,
            color_sigma,
            position_sigma,
        }
    }
}

impl SimilarityMatrix for PixelSimilarityMatrix {
    fn get(&self, i: usize, j: usize) -> f64 {
        let color_distance: f64 = self.colors[i]
            .iter()
            .zip(&self.colors[j])
            .map(|(a, b)| (a - b).powi(2))
            .sum();
        let (row_i, col_i) = ((i / self.cols) as f64, (i % self.cols) as f64);
        let (row_j, col_j) = ((j / self.cols) as f64, (j % self.cols) as f64);
        let position_distance = (row_i - row_j).powi(2) + (col_i - col_j).powi(2);

        (-color_distance / self.color_sigma.powi(2)).exp()
            * (-position_distance / self.position_sigma.powi(2)).exp()
    }

    fn rows(&self) -> usize {
        self.colors.len()
    }
}

/// Segment the foreground into `nb_segments` classes by spectral clustering
/// of its pixels on an 8 nearest neighbours graph.
///
/// Pixels of one class form one segment, even when not connected, and the
/// background forms another.
pub fn spectral_clustering_segmentation(
    image: &FloatImage,
    mask: &Mask,
    nb_segments: usize,
) -> Result<DisjointSetForest> {
    check_image(image, mask)?;
    let foreground = count_foreground(mask);
    if nb_segments == 0 || nb_segments >= foreground {
        return Err(SegmentationError::InvalidParameter(format!(
            "{nb_segments} segments for {foreground} foreground pixels"
        )));
    }

    let pixels = linear_mask(mask);
    let similarity = PixelSimilarityMatrix::new(image);
    let neighbors = NEAREST_NEIGHBORS.min(foreground - 1);
    let graph_rep = MaskedGraph::new(pixels.clone(), Box::new(KNearestGraph { k: neighbors }));
    let classes = spectral_clustering(
        &similarity,
        &graph_rep,
        MatrixRepresentation::NormalizedLaplacian,
        nb_segments,
        true,
    )?;

    let mut segmentation = DisjointSetForest::new(pixels.len());
    let mut class_representative: Vec<Option<usize>> = vec![None; nb_segments];
    let mut background_representative = None;
    let mut foreground_classes = classes.iter();

    for (index, &in_foreground) in pixels.iter().enumerate() {
        let class = if in_foreground {
            foreground_classes.next().copied()
        } else {
            None
        };
        let representative = match class {
            Some(class) => &mut class_representative[class],
            None => &mut background_representative,
        };
        match *representative {
            Some(first) => {
                segmentation.union(first, index);
            }
            None => *representative = Some(index),
        }
    }

    log::debug!(
        "spectral clustering segmentation: {} segments",
        segmentation.number_of_components()
    );
    Ok(segmentation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::full_mask;
    use ndarray::Array3;

    fn halves() -> FloatImage {
        Array3::from_shape_fn((4, 6, 3), |(_, j, _)| if j < 3 { 0.0 } else { 100.0 })
    }

    #[test]
    fn test_pixel_similarity() {
        let similarity = PixelSimilarityMatrix::with_sigmas(&halves(), 100.0, 2.0);
        assert_eq!(similarity.rows(), 24);
        assert!((similarity.get(5, 5) - 1.0).abs() < 1e-12);
        assert_eq!(similarity.get(2, 9), similarity.get(9, 2));
        // pixels (0, 0) and (0, 1): same color, one column apart
        assert!((similarity.get(0, 1) - (-0.25f64).exp()).abs() < 1e-12);
        // pixels (0, 2) and (0, 3): one column apart across the color edge
        assert!((similarity.get(2, 3) - (-3.0f64 - 0.25).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_background_is_one_segment() {
        let mut mask = full_mask(4, 6);
        for i in 0..4 {
            mask[[i, 5]] = false;
        }

        let mut one = spectral_clustering_segmentation(&halves(), &mask, 1).unwrap();
        assert_eq!(one.number_of_elements(), 24);
        assert_eq!(one.number_of_components(), 2);
        assert!(one.same_set(0, 4));
        assert!(one.same_set(5, 23));
        assert!(!one.same_set(0, 5));

        let mut two = spectral_clustering_segmentation(&halves(), &mask, 2).unwrap();
        assert!(two.number_of_components() <= 3);
        assert!(two.same_set(11, 17));
        assert!(!two.same_set(11, 10));
    }

    #[test]
    fn test_segment_count_is_checked() {
        let mask = full_mask(4, 6);
        assert!(spectral_clustering_segmentation(&halves(), &mask, 0).is_err());
        assert!(spectral_clustering_segmentation(&halves(), &mask, 24).is_err());
    }
}
