use crate::color::rgb_image_to_lab;
use crate::error::{Result, SegmentationError};
use crate::image::{check_image, count_foreground, FloatImage, Mask, RgbImage};
use crate::image_graphs::{constant_one, grid_graph, Connectivity};
use crate::kuwahara::kuwahara_filter;
use aci_graph::connected_components;
use ndarray::{s, Array3};
use serde::{Deserialize, Serialize};

/// Parameters of [`pre_process`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreProcessingParams {
    pub kuwahara_half_size: usize,
    /// Images with more foreground pixels are scaled down
    pub max_pixels: usize,
}

impl Default for PreProcessingParams {
    fn default() -> Self {
        Self {
            kuwahara_half_size: 5,
            max_pixels: 15000,
        }
    }
}

/// Crop an image and its mask to the bounding box of the foreground
pub fn crop<A: Clone>(image: &Array3<A>, mask: &Mask) -> Result<(Array3<A>, Mask)> {
    check_image(image, mask)?;

    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for ((i, j), &foreground) in mask.indexed_iter() {
        if foreground {
            bounds = Some(match bounds {
                None => (i, i, j, j),
                Some((top, bottom, left, right)) => {
                    (top.min(i), bottom.max(i), left.min(j), right.max(j))
                }
            });
        }
    }

    let (top, bottom, left, right) = bounds.ok_or(SegmentationError::EmptyMask)?;
    Ok((
        image.slice(s![top..=bottom, left..=right, ..]).to_owned(),
        mask.slice(s![top..=bottom, left..=right]).to_owned(),
    ))
}

/// Nearest neighbour resize of an image and its mask so that the foreground
/// has about `max_pixels` pixels, by a ratio of `sqrt(max_pixels / foreground)`
/// on both axes. Smaller images are returned as is.
pub fn resize_to_max_pixels<A: Clone>(
    image: &Array3<A>,
    mask: &Mask,
    max_pixels: usize,
) -> Result<(Array3<A>, Mask)> {
    check_image(image, mask)?;
    let foreground = count_foreground(mask);
    if foreground <= max_pixels {
        return Ok((image.clone(), mask.clone()));
    }

    let ratio = (max_pixels as f64 / foreground as f64).sqrt();
    let (rows, cols, channels) = image.dim();
    let new_rows = ((rows as f64 * ratio).round() as usize).max(1);
    let new_cols = ((cols as f64 * ratio).round() as usize).max(1);
    let source = |index: usize, new_size: usize, size: usize| -> usize {
        let position = (index as f64 + 0.5) * size as f64 / new_size as f64;
        (position.floor() as usize).min(size - 1)
    };

    let resized = Array3::from_shape_fn((new_rows, new_cols, channels), |(i, j, c)| {
        image[[source(i, new_rows, rows), source(j, new_cols, cols), c]].clone()
    });
    let resized_mask = Mask::from_shape_fn((new_rows, new_cols), |(i, j)| {
        mask[[source(i, new_rows, rows), source(j, new_cols, cols)]]
    });

    log::debug!("resized {rows}x{cols} to {new_rows}x{new_cols}");
    Ok((resized, resized_mask))
}

/// Keep only the largest 4-connected component of the foreground
pub fn largest_component_mask(mask: &Mask) -> Result<Mask> {
    let (rows, cols) = mask.dim();
    let structure = Array3::<u8>::zeros((rows, cols, 3));
    let grid = grid_graph(&structure, Connectivity::Four, mask, constant_one, false)?;
    let (component, count) = connected_components(&grid);

    let mut sizes = vec![0usize; count];
    for (&label, &foreground) in component.iter().zip(mask.iter()) {
        if foreground {
            sizes[label] += 1;
        }
    }

    let largest = sizes
        .iter()
        .enumerate()
        .rev()
        .max_by_key(|&(_, &size)| size)
        .map(|(label, _)| label)
        .ok_or(SegmentationError::EmptyMask)?;

    Ok(Mask::from_shape_fn((rows, cols), |(i, j)| {
        mask[[i, j]] && component[j + cols * i] == largest
    }))
}

/// Prepare an animation character image for segmentation: crop to the
/// foreground, scale down to at most `max_pixels` foreground pixels, keep
/// the largest foreground component, convert to Lab and apply the Kuwahara
/// filter.
pub fn pre_process(image: &RgbImage, mask: &Mask, params: &PreProcessingParams) -> Result<(FloatImage, Mask)> {
    let (cropped, cropped_mask) = crop(image, mask)?;
    let (resized, resized_mask) = resize_to_max_pixels(&cropped, &cropped_mask, params.max_pixels)?;
    let connected_mask = largest_component_mask(&resized_mask)?;
    let lab = rgb_image_to_lab(&resized);
    let filtered = kuwahara_filter(&lab, params.kuwahara_half_size)?;

    log::debug!(
        "pre-processed image: {} foreground pixels",
        count_foreground(&connected_mask)
    );
    Ok((filtered, connected_mask))
}
