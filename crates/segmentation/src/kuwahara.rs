use crate::error::{Result, SegmentationError};
use crate::image::FloatImage;
use ndarray::{s, ArrayView3};

/// Mean color of a window and mean Euclidean distance of its pixels to it
fn window_statistics(window: ArrayView3<f32>) -> ([f64; 3], f64) {
    let count = (window.shape()[0] * window.shape()[1]) as f64;
    let mut mean = [0.0f64; 3];
    for row in window.outer_iter() {
        for pixel in row.outer_iter() {
            for (c, value) in mean.iter_mut().enumerate() {
                *value += f64::from(pixel[c]);
            }
        }
    }
    for value in &mut mean {
        *value /= count;
    }

    let mut spread = 0.0;
    for row in window.outer_iter() {
        for pixel in row.outer_iter() {
            spread += (0..3)
                .map(|c| (f64::from(pixel[c]) - mean[c]).powi(2))
                .sum::<f64>()
                .sqrt();
        }
    }

    (mean, spread / count)
}

/// Edge preserving Kuwahara filter, meant for Lab images.
///
/// Each pixel takes the mean color of whichever of its four
/// `(half_size + 1) x (half_size + 1)` quadrants (clipped to the image) has
/// the smallest mean distance to its own mean.
pub fn kuwahara_filter(image: &FloatImage, half_size: usize) -> Result<FloatImage> {
    let (rows, cols, channels) = image.dim();
    if channels != 3 {
        return Err(SegmentationError::ChannelCount(channels));
    }

    let mut filtered = image.clone();
    for i in 0..rows {
        for j in 0..cols {
            let top = i.saturating_sub(half_size);
            let bottom = (i + half_size).min(rows - 1);
            let left = j.saturating_sub(half_size);
            let right = (j + half_size).min(cols - 1);

            let quadrants = [
                (top, i, left, j),
                (top, i, j, right),
                (i, bottom, left, j),
                (i, bottom, j, right),
            ];

            let mut best: Option<([f64; 3], f64)> = None;
            for (row_start, row_end, col_start, col_end) in quadrants {
                let window = image.slice(s![row_start..=row_end, col_start..=col_end, ..]);
                let (mean, spread) = window_statistics(window);
                if best.map_or(true, |(_, best_spread)| spread < best_spread) {
                    best = Some((mean, spread));
                }
            }

            if let Some((mean, _)) = best {
                for (c, value) in mean.into_iter().enumerate() {
                    filtered[[i, j, c]] = value as f32;
                }
            }
        }
    }

    log::debug!("kuwahara filter on {rows}x{cols} pixels, half size {half_size}");
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use proptest::prelude::*;

    #[test]
    fn test_uniform_image_is_unchanged() {
        let image = Array3::from_elem((5, 5, 3), 42.0f32);
        assert_eq!(kuwahara_filter(&image, 2).unwrap(), image);
    }

    #[test]
    fn test_preserves_edges() {
        // left two columns dark, right three bright
        let image = Array3::from_shape_fn((5, 5, 3), |(_, j, _)| if j < 2 { 0.0f32 } else { 80.0 });
        let filtered = kuwahara_filter(&image, 1).unwrap();
        assert_eq!(filtered, image);
    }

    #[test]
    fn test_smooths_noise() {
        let mut image = Array3::from_elem((5, 5, 3), 10.0f32);
        image[[2, 2, 0]] = 90.0;
        let filtered = kuwahara_filter(&image, 1).unwrap();
        assert!(filtered[[2, 2, 0]] < 90.0);
        assert!(kuwahara_filter(&Array3::zeros((2, 2, 1)), 1).is_err());
    }

    proptest! {
        #[test]
        fn prop_output_within_input_range(
            values in proptest::collection::vec(-100.0f32..100.0, 4 * 5 * 3),
            half_size in 0usize..4,
        ) {
            let image = Array3::from_shape_vec((4, 5, 3), values).unwrap();
            let filtered = kuwahara_filter(&image, half_size).unwrap();
            for c in 0..3 {
                let channel = image.index_axis(ndarray::Axis(2), c);
                let low = channel.iter().copied().fold(f32::INFINITY, f32::min);
                let high = channel.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                for &value in filtered.index_axis(ndarray::Axis(2), c) {
                    prop_assert!(value >= low - 1e-3 && value <= high + 1e-3);
                }
            }
        }
    }
}
