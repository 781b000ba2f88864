//! sRGB to CIE Lab conversions under the D65 illuminant.

use crate::image::{FloatImage, RgbImage};
use ndarray::Array3;

const WHITE: [f64; 3] = [0.95047, 1.0, 1.08883];
const EPSILON: f64 = 6.0 / 29.0;

fn to_linear(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn from_linear(c: f64) -> u8 {
    let c = if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn f(t: f64) -> f64 {
    if t > EPSILON.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * EPSILON * EPSILON) + 4.0 / 29.0
    }
}

fn f_inverse(t: f64) -> f64 {
    if t > EPSILON {
        t.powi(3)
    } else {
        3.0 * EPSILON * EPSILON * (t - 4.0 / 29.0)
    }
}

/// `L` in `0..=100`, `a` and `b` roughly in `-128..128`
pub fn rgb_to_lab(rgb: [u8; 3]) -> [f32; 3] {
    let [r, g, b] = rgb.map(to_linear);

    let x = 0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b;
    let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b;
    let z = 0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b;

    let fx = f(x / WHITE[0]);
    let fy = f(y / WHITE[1]);
    let fz = f(z / WHITE[2]);

    [
        (116.0 * fy - 16.0) as f32,
        (500.0 * (fx - fy)) as f32,
        (200.0 * (fy - fz)) as f32,
    ]
}

/// Inverse of [`rgb_to_lab`], clamping out of gamut colors
pub fn lab_to_rgb(lab: [f32; 3]) -> [u8; 3] {
    let [l, a, b] = lab.map(f64::from);
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = WHITE[0] * f_inverse(fx);
    let y = WHITE[1] * f_inverse(fy);
    let z = WHITE[2] * f_inverse(fz);

    [
        from_linear(3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z),
        from_linear(-0.969_266_0 * x + 1.876_010_8 * y + 0.041_556_0 * z),
        from_linear(0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z),
    ]
}

pub fn rgb_image_to_lab(image: &RgbImage) -> FloatImage {
    let (rows, cols, _) = image.dim();
    let mut lab = Array3::zeros((rows, cols, 3));
    for i in 0..rows {
        for j in 0..cols {
            let converted = rgb_to_lab([image[[i, j, 0]], image[[i, j, 1]], image[[i, j, 2]]]);
            for (c, value) in converted.into_iter().enumerate() {
                lab[[i, j, c]] = value;
            }
        }
    }
    lab
}

pub fn lab_image_to_rgb(image: &FloatImage) -> RgbImage {
    let (rows, cols, _) = image.dim();
    let mut rgb = Array3::zeros((rows, cols, 3));
    for i in 0..rows {
        for j in 0..cols {
            let converted = lab_to_rgb([image[[i, j, 0]], image[[i, j, 1]], image[[i, j, 2]]]);
            for (c, value) in converted.into_iter().enumerate() {
                rgb[[i, j, c]] = value;
            }
        }
    }
    rgb
}
