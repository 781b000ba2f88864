use crate::error::{Result, SegmentationError};
use ndarray::{Array2, Array3};

/// 8 bit color image, `rows x cols x 3`
pub type RgbImage = Array3<u8>;

/// Floating point color image, `rows x cols x 3`, such as a CIE Lab image
pub type FloatImage = Array3<f32>;

/// Foreground mask, `true` for pixels to take into account
pub type Mask = Array2<bool>;

/// Row-major index of the pixel at column `x` and row `y`
pub fn to_row_major(width: usize, x: usize, y: usize) -> usize {
    x + width * y
}

/// `(row, col)` of the pixel at a row-major index
pub fn from_row_major(width: usize, index: usize) -> (usize, usize) {
    (index / width, index % width)
}

/// Mask selecting every pixel
pub fn full_mask(rows: usize, cols: usize) -> Mask {
    Mask::from_elem((rows, cols), true)
}

pub fn count_foreground(mask: &Mask) -> usize {
    mask.iter().filter(|&&foreground| foreground).count()
}

/// Mask as a vector in row-major order
pub fn linear_mask(mask: &Mask) -> Vec<bool> {
    mask.iter().copied().collect()
}

/// Check that an image has 3 channels and the dimensions of its mask
pub fn check_image<A>(image: &Array3<A>, mask: &Mask) -> Result<()> {
    let (rows, cols, channels) = image.dim();
    if channels != 3 {
        return Err(SegmentationError::ChannelCount(channels));
    }
    if mask.dim() != (rows, cols) {
        return Err(SegmentationError::MaskMismatch {
            image_rows: rows,
            image_cols: cols,
            mask_rows: mask.nrows(),
            mask_cols: mask.ncols(),
        });
    }
    Ok(())
}

/// Color of a pixel as `f64` channels
pub fn pixel<A: Copy + Into<f64>>(image: &Array3<A>, row: usize, col: usize) -> [f64; 3] {
    [
        image[[row, col, 0]].into(),
        image[[row, col, 1]].into(),
        image[[row, col, 2]].into(),
    ]
}

pub fn rgb_to_float(image: &RgbImage) -> FloatImage {
    image.mapv(f32::from)
}

/// Round and clamp a floating point image back to 8 bits
pub fn float_to_rgb(image: &FloatImage) -> RgbImage {
    image.mapv(|value| value.round().clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_row_major_round_trip() {
        let index = to_row_major(7, 3, 2);
        assert_eq!(index, 17);
        assert_eq!(from_row_major(7, index), (2, 3));
    }

    #[test]
    fn test_count_foreground() {
        let mask = array![[true, false], [true, true]];
        assert_eq!(count_foreground(&mask), 3);
        assert_eq!(count_foreground(&full_mask(2, 5)), 10);
        assert_eq!(linear_mask(&mask), vec![true, false, true, true]);
    }

    #[test]
    fn test_check_image() {
        let image = RgbImage::zeros((2, 3, 3));
        assert!(check_image(&image, &full_mask(2, 3)).is_ok());
        assert!(matches!(
            check_image(&image, &full_mask(3, 2)),
            Err(SegmentationError::MaskMismatch { .. })
        ));
        assert!(matches!(
            check_image(&RgbImage::zeros((2, 3, 1)), &full_mask(2, 3)),
            Err(SegmentationError::ChannelCount(1))
        ));
    }

    #[test]
    fn test_float_conversions_clamp() {
        let image = FloatImage::from_shape_vec((1, 1, 3), vec![-3.0, 127.6, 300.0]).unwrap();
        let rgb: Vec<u8> = float_to_rgb(&image).iter().copied().collect();
        assert_eq!(rgb, vec![0, 128, 255]);
    }
}
