use crate::error::{Result, SegmentationError};
use crate::image::{check_image, FloatImage, Mask};
use aci_graph::{DisjointSetForest, LabeledGraph};

/// Computes a label vector for each segment of a segmentation.
///
/// Only foreground pixels contribute. Segments are indexed as in
/// [`DisjointSetForest::root_indexes`]; segments without foreground pixels
/// get a zero label.
pub trait Labeling {
    fn segment_labels(
        &self,
        image: &FloatImage,
        mask: &Mask,
        segmentation: &DisjointSetForest,
    ) -> Result<Vec<Vec<f32>>>;

    /// Label vertex `v` of `graph` with the label of segment `segments[v]`
    fn label_graph(
        &self,
        image: &FloatImage,
        mask: &Mask,
        segmentation: &DisjointSetForest,
        graph: &mut LabeledGraph<Vec<f32>>,
        segments: &[usize],
    ) -> Result<()> {
        let labels = self.segment_labels(image, mask, segmentation)?;
        for (vertex, &segment) in segments.iter().enumerate() {
            let label = labels.get(segment).cloned().ok_or_else(|| {
                SegmentationError::InvalidParameter(format!("no segment {segment}"))
            })?;
            graph.set_label(vertex, label);
        }
        Ok(())
    }
}

struct ForegroundPixel {
    segment: usize,
    row: usize,
    col: usize,
}

/// Foreground pixels with their segment, and the number of segments
fn foreground_pixels(
    image: &FloatImage,
    mask: &Mask,
    segmentation: &DisjointSetForest,
) -> Result<(Vec<ForegroundPixel>, usize)> {
    check_image(image, mask)?;
    let (rows, cols) = mask.dim();
    if segmentation.number_of_elements() < rows * cols {
        return Err(SegmentationError::InvalidParameter(format!(
            "segmentation of {} elements for {rows}x{cols} pixels",
            segmentation.number_of_elements()
        )));
    }

    let segment = segmentation.segment_indexes();
    let pixels = mask
        .indexed_iter()
        .filter(|&(_, &foreground)| foreground)
        .map(|((row, col), _)| ForegroundPixel {
            segment: segment[col + cols * row],
            row,
            col,
        })
        .collect();
    Ok((pixels, segmentation.number_of_components()))
}

/// Sum a per pixel vector over each segment, then divide by the segment's
/// foreground pixel count
fn segment_means<F>(
    image: &FloatImage,
    mask: &Mask,
    segmentation: &DisjointSetForest,
    dimension: usize,
    mut accumulate: F,
) -> Result<Vec<Vec<f32>>>
where
    F: FnMut(&ForegroundPixel, &mut [f64]),
{
    let (pixels, segments) = foreground_pixels(image, mask, segmentation)?;
    let mut sums = vec![vec![0.0f64; dimension]; segments];
    let mut counts = vec![0usize; segments];

    for pixel in &pixels {
        accumulate(pixel, &mut sums[pixel.segment]);
        counts[pixel.segment] += 1;
    }

    Ok(sums
        .into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            sum.into_iter()
                .map(|value| if count == 0 { 0.0 } else { (value / count as f64) as f32 })
                .collect()
        })
        .collect())
}

/// Normalized color histogram with `bins_per_channel^3` bins. Channel value
/// `c` in `0..=255` falls into bin `floor(c / 255 * (bins - 1))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorHistogramLabeling {
    pub bins_per_channel: usize,
}

impl ColorHistogramLabeling {
    fn bin(&self, value: f32) -> usize {
        let value = f64::from(value).clamp(0.0, 255.0);
        (value / 255.0 * (self.bins_per_channel - 1) as f64).floor() as usize
    }
}

impl Labeling for ColorHistogramLabeling {
    fn segment_labels(
        &self,
        image: &FloatImage,
        mask: &Mask,
        segmentation: &DisjointSetForest,
    ) -> Result<Vec<Vec<f32>>> {
        let bins = self.bins_per_channel;
        if bins == 0 {
            return Err(SegmentationError::InvalidParameter(
                "color histograms need at least one bin".into(),
            ));
        }

        segment_means(image, mask, segmentation, bins.pow(3), |pixel, histogram| {
            let index = (0..3).fold(0, |index, channel| {
                index * bins + self.bin(image[[pixel.row, pixel.col, channel]])
            });
            histogram[index] += 1.0;
        })
    }
}

/// Mean color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AverageColorLabeling;

impl Labeling for AverageColorLabeling {
    fn segment_labels(
        &self,
        image: &FloatImage,
        mask: &Mask,
        segmentation: &DisjointSetForest,
    ) -> Result<Vec<Vec<f32>>> {
        segment_means(image, mask, segmentation, 3, |pixel, sum| {
            for (channel, value) in sum.iter_mut().enumerate() {
                *value += f64::from(image[[pixel.row, pixel.col, channel]]);
            }
        })
    }
}

/// Mean `(row, col)` position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GravityCenterLabeling;

impl Labeling for GravityCenterLabeling {
    fn segment_labels(
        &self,
        image: &FloatImage,
        mask: &Mask,
        segmentation: &DisjointSetForest,
    ) -> Result<Vec<Vec<f32>>> {
        segment_means(image, mask, segmentation, 2, |pixel, sum| {
            sum[0] += pixel.row as f64;
            sum[1] += pixel.col as f64;
        })
    }
}

/// Fraction of the foreground covered by the segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentAreaLabeling;

impl Labeling for SegmentAreaLabeling {
    fn segment_labels(
        &self,
        image: &FloatImage,
        mask: &Mask,
        segmentation: &DisjointSetForest,
    ) -> Result<Vec<Vec<f32>>> {
        let (pixels, segments) = foreground_pixels(image, mask, segmentation)?;
        let mut counts = vec![0usize; segments];
        for pixel in &pixels {
            counts[pixel.segment] += 1;
        }

        let total = pixels.len().max(1) as f32;
        Ok(counts
            .into_iter()
            .map(|count| vec![count as f32 / total])
            .collect())
    }
}

/// Concatenation of the labels of several labelings, in order
#[derive(Default)]
pub struct ConcatenatedLabeling {
    labelings: Vec<Box<dyn Labeling + Send + Sync>>,
}

impl ConcatenatedLabeling {
    pub fn new(labelings: Vec<Box<dyn Labeling + Send + Sync>>) -> Self {
        Self { labelings }
    }

    pub fn push(mut self, labeling: impl Labeling + Send + Sync + 'static) -> Self {
        self.labelings.push(Box::new(labeling));
        self
    }
}

impl Labeling for ConcatenatedLabeling {
    fn segment_labels(
        &self,
        image: &FloatImage,
        mask: &Mask,
        segmentation: &DisjointSetForest,
    ) -> Result<Vec<Vec<f32>>> {
        let mut labels = vec![Vec::new(); segmentation.number_of_components()];
        for labeling in &self.labelings {
            for (label, part) in labels
                .iter_mut()
                .zip(labeling.segment_labels(image, mask, segmentation)?)
            {
                label.extend(part);
            }
        }
        Ok(labels)
    }
}
