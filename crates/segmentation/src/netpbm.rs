//! Binary and ASCII Netpbm images: PPM for colors, PGM for masks.

use crate::error::{Result, SegmentationError};
use crate::image::{Mask, RgbImage};
use ndarray::{Array2, Array3};
use std::fs;
use std::path::Path;

struct Raster {
    width: usize,
    height: usize,
    /// Samples scaled to `0..=255`
    samples: Vec<u8>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn skip_separators(&mut self) {
        while let Some(&byte) = self.bytes.get(self.position) {
            if byte == b'#' {
                while let Some(&byte) = self.bytes.get(self.position) {
                    self.position += 1;
                    if byte == b'\n' {
                        break;
                    }
                }
            } else if byte.is_ascii_whitespace() {
                self.position += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a [u8]> {
        self.skip_separators();
        let start = self.position;
        while let Some(byte) = self.bytes.get(self.position) {
            if byte.is_ascii_whitespace() || *byte == b'#' {
                break;
            }
            self.position += 1;
        }

        if start == self.position {
            return Err(SegmentationError::Netpbm("unexpected end of data".into()));
        }
        let bytes = self.bytes;
        Ok(&bytes[start..self.position])
    }

    fn number(&mut self) -> Result<usize> {
        let token = self.token()?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| {
                SegmentationError::Netpbm(format!(
                    "expected a number, got {:?}",
                    String::from_utf8_lossy(token)
                ))
            })
    }
}

fn scale(value: usize, max_value: usize) -> Result<u8> {
    if value > max_value {
        return Err(SegmentationError::Netpbm(format!(
            "sample {value} exceeds maximum {max_value}"
        )));
    }
    Ok(((value * 255 + max_value / 2) / max_value) as u8)
}

fn decode(bytes: &[u8], channels: usize, ascii_magic: &[u8], binary_magic: &[u8]) -> Result<Raster> {
    let mut reader = Reader::new(bytes);
    let magic = reader.token()?;
    let binary = if magic == binary_magic {
        true
    } else if magic == ascii_magic {
        false
    } else {
        return Err(SegmentationError::Netpbm(format!(
            "unsupported magic number {:?}",
            String::from_utf8_lossy(magic)
        )));
    };

    let width = reader.number()?;
    let height = reader.number()?;
    let max_value = reader.number()?;
    if max_value == 0 || max_value > u16::MAX as usize {
        return Err(SegmentationError::Netpbm(format!(
            "invalid maximum value {max_value}"
        )));
    }

    let too_large = || SegmentationError::Netpbm("image too large".into());
    let count = width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(channels))
        .ok_or_else(too_large)?;
    let remaining = bytes.len().saturating_sub(reader.position);

    if binary {
        // a single whitespace byte separates the header from the raster
        let start = reader.position + 1;
        let sample_size = if max_value < 256 { 1 } else { 2 };
        let length = count.checked_mul(sample_size).ok_or_else(too_large)?;
        let raster = start
            .checked_add(length)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| SegmentationError::Netpbm("truncated raster".into()))?;

        let mut samples = Vec::with_capacity(count);

        for sample in raster.chunks_exact(sample_size) {
            let value = sample
                .iter()
                .fold(0usize, |value, &byte| (value << 8) | byte as usize);
            samples.push(scale(value, max_value)?);
        }
        Ok(Raster {
            width,
            height,
            samples,
        })
    } else {
        // each ascii sample takes at least one byte
        if count > remaining {
            return Err(SegmentationError::Netpbm("truncated raster".into()));
        }
        let mut samples = Vec::with_capacity(count);
        for _ in 0..count {
            samples.push(scale(reader.number()?, max_value)?);
        }
        Ok(Raster {
            width,
            height,
            samples,
        })
    }
}

/// Decode a P3 or P6 image
pub fn decode_ppm(bytes: &[u8]) -> Result<RgbImage> {
    let raster = decode(bytes, 3, b"P3", b"P6")?;
    Array3::from_shape_vec((raster.height, raster.width, 3), raster.samples)
        .map_err(|err| SegmentationError::Netpbm(err.to_string()))
}

/// Decode a P2 or P5 image
pub fn decode_pgm(bytes: &[u8]) -> Result<Array2<u8>> {
    let raster = decode(bytes, 1, b"P2", b"P5")?;
    Array2::from_shape_vec((raster.height, raster.width), raster.samples)
        .map_err(|err| SegmentationError::Netpbm(err.to_string()))
}

/// Encode as binary P6
pub fn encode_ppm(image: &RgbImage) -> Vec<u8> {
    let (rows, cols, _) = image.dim();
    let mut bytes = format!("P6\n{cols} {rows}\n255\n").into_bytes();
    bytes.extend(image.iter());
    bytes
}

/// Encode as binary P5
pub fn encode_pgm(image: &Array2<u8>) -> Vec<u8> {
    let (rows, cols) = image.dim();
    let mut bytes = format!("P5\n{cols} {rows}\n255\n").into_bytes();
    bytes.extend(image.iter());
    bytes
}

pub fn read_ppm(path: impl AsRef<Path>) -> Result<RgbImage> {
    decode_ppm(&fs::read(path)?)
}

pub fn write_ppm(path: impl AsRef<Path>, image: &RgbImage) -> Result<()> {
    fs::write(path, encode_ppm(image))?;
    Ok(())
}

pub fn write_pgm(path: impl AsRef<Path>, image: &Array2<u8>) -> Result<()> {
    fs::write(path, encode_pgm(image))?;
    Ok(())
}

/// Read a PGM mask where non zero pixels are foreground, or background when
/// `invert` is set
pub fn read_pgm_mask(path: impl AsRef<Path>, invert: bool) -> Result<Mask> {
    let gray = decode_pgm(&fs::read(path)?)?;
    Ok(gray.mapv(|value| (value != 0) != invert))
}

/// Mask as a PGM image, 255 for foreground
pub fn mask_to_gray(mask: &Mask) -> Array2<u8> {
    mask.mapv(|foreground| if foreground { 255 } else { 0 })
}
