//! # ACI Segmentation
//!
//! Turns animation character images into segmentation graphs.
//!
//! ## Features
//!
//! - **Netpbm I/O** - PPM images and PGM masks, ASCII or binary
//! - **Pre-processing** - cropping, scaling, Lab conversion, Kuwahara filter
//! - **Image graphs** - grid, k nearest neighbours and radius graphs over pixels
//! - **Felzenszwalb** - graph-based segmentation with small segment fusion
//! - **Graph partitioning** - isoperimetric partitioning and normalized cuts
//! - **Spectral segmentation** - spectral clustering of pixels
//! - **Segmentation graphs** - adjacency of segments, labeled by segment attributes
//!
//! ## Architecture
//!
//! ```text
//! RGB image + mask
//!     │
//!     └──> pre_process ──> Lab image ──> grid_graph ──> felzenszwalb_segment
//!                                                              │
//!               Labeling <── segmentation_graph <── DisjointSetForest
//!                  │
//!                  └──> LabeledGraph<Vec<f32>>
//! ```

mod attributes;
mod bipartition;
mod color;
mod error;
mod felzenszwalb;
mod image;
mod image_graphs;
mod isoperimetric;
mod kuwahara;
mod netpbm;
mod normalized_cuts;
mod preprocessing;
mod segment;
mod segmentation_graph;
mod spectral_segmentation;

pub use attributes::{
    AverageColorLabeling, ColorHistogramLabeling, ConcatenatedLabeling, GravityCenterLabeling,
    Labeling, SegmentAreaLabeling,
};
pub use color::{lab_image_to_rgb, lab_to_rgb, rgb_image_to_lab, rgb_to_lab};
pub use error::{Result, SegmentationError};
pub use felzenszwalb::{combine_segmentations, felzenszwalb_segment, ScaleType};
pub use image::{
    check_image, count_foreground, float_to_rgb, from_row_major, full_mask, linear_mask, pixel,
    rgb_to_float, to_row_major, FloatImage, Mask, RgbImage,
};
pub use image_graphs::{
    constant_one, euclidean_distance, grid_graph, k_nearest_graph, pixel_features, radius_graph,
    Connectivity,
};
pub use isoperimetric::isoperimetric_graph_partitioning;
pub use kuwahara::kuwahara_filter;
pub use netpbm::{
    decode_pgm, decode_ppm, encode_pgm, encode_ppm, mask_to_gray, read_pgm_mask, read_ppm,
    write_pgm, write_ppm,
};
pub use normalized_cuts::normalized_cuts;
pub use preprocessing::{
    crop, largest_component_mask, pre_process, resize_to_max_pixels, PreProcessingParams,
};
pub use segment::{
    region_image, segment, segmentation_image_to_segmentation, SegmentationParams, SegmentedImage,
};
pub use segmentation_graph::{segment_centers, segmentation_graph};
pub use spectral_segmentation::{spectral_clustering_segmentation, PixelSimilarityMatrix};
