use crate::config::AciConfig;
use crate::dataset::{read_image, segment_image};
use aci_segmentation::{count_foreground, lab_image_to_rgb, linear_mask, region_image, write_ppm};
use anyhow::{Context as AnyhowContext, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentReport {
    pub image: PathBuf,
    pub output: PathBuf,
    /// Size after pre-processing
    pub rows: usize,
    pub cols: usize,
    pub foreground_pixels: usize,
    /// Segments covering foreground pixels
    pub segments: usize,
    /// Vertices of the largest connected component of the segmentation graph
    pub graph_vertices: usize,
    /// Pairs of adjacent segments in that component
    pub adjacent_pairs: usize,
}

/// Pre-process and segment an image, then write its region image
pub fn run_segment(
    image: &Path,
    mask: Option<&Path>,
    invert_mask: bool,
    output: &Path,
    config: &AciConfig,
) -> Result<SegmentReport> {
    let (rgb, mask) = read_image(image, mask, invert_mask)?;
    let segmented = segment_image(&rgb, &mask, config)
        .with_context(|| format!("While processing {}", image.display()))?;

    let (rows, cols, _) = segmented.image.dim();
    let labels = segmented.segmented.segmentation.segment_indexes();
    let segments: BTreeSet<usize> = linear_mask(&segmented.mask)
        .into_iter()
        .zip(&labels)
        .filter(|&(foreground, _)| foreground)
        .map(|(_, &label)| label)
        .collect();

    let regions = region_image(&lab_image_to_rgb(&segmented.image), &segmented.segmented.segmentation)?;
    write_ppm(output, &regions).with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("{} segments written to {}", segments.len(), output.display());

    let graph = &segmented.segmented.graph;
    Ok(SegmentReport {
        image: image.to_path_buf(),
        output: output.to_path_buf(),
        rows,
        cols,
        foreground_pixels: count_foreground(&segmented.mask),
        segments: segments.len(),
        graph_vertices: graph.number_of_vertices(),
        adjacent_pairs: graph.number_of_edges() / 2,
    })
}
