//! Character image datasets described by a `dataset.toml` manifest.
//!
//! ```toml
//! invert_masks = true
//!
//! [[characters]]
//! name = "rei"
//! images = [
//!     { image = "rei_a.ppm", mask = "rei_a-mask.pgm" },
//!     { image = "rei_b.ppm" },
//! ]
//! ```

use crate::config::AciConfig;
use aci_graph::LabeledGraph;
use aci_segmentation::{
    full_mask, pre_process, read_pgm_mask, read_ppm, segment, AverageColorLabeling,
    ConcatenatedLabeling, FloatImage, GravityCenterLabeling, Mask, RgbImage, SegmentAreaLabeling,
    SegmentedImage,
};
use anyhow::{bail, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "dataset.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Masks mark the foreground in black
    #[serde(default = "default_invert_masks")]
    pub invert_masks: bool,
    pub characters: Vec<CharacterEntry>,
}

fn default_invert_masks() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterEntry {
    pub name: String,
    pub images: Vec<ImageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub image: PathBuf,
    /// Without a mask every pixel is foreground
    #[serde(default)]
    pub mask: Option<PathBuf>,
}

impl DatasetManifest {
    pub fn from_toml(text: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(text).context("Invalid dataset manifest")?;
        if manifest.characters.is_empty() {
            bail!("Dataset manifest lists no characters");
        }
        Ok(manifest)
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("In {}", path.display()))
    }

    pub fn number_of_images(&self) -> usize {
        self.characters.iter().map(|character| character.images.len()).sum()
    }
}

/// One dataset image turned into a labeled segmentation graph
#[derive(Debug, Clone)]
pub struct Sample {
    pub character: String,
    /// Index of the character in the manifest
    pub class: usize,
    pub image: PathBuf,
    pub graph: LabeledGraph<Vec<f32>>,
}

/// Pre-processed image and mask with their segmentation
pub struct Segmented {
    pub image: FloatImage,
    pub mask: Mask,
    pub segmented: SegmentedImage,
}

/// Read an image and its optional mask
pub fn read_image(image: &Path, mask: Option<&Path>, invert_mask: bool) -> Result<(RgbImage, Mask)> {
    let rgb = read_ppm(image).with_context(|| format!("Failed to read image {}", image.display()))?;
    let mask = match mask {
        Some(path) => read_pgm_mask(path, invert_mask)
            .with_context(|| format!("Failed to read mask {}", path.display()))?,
        None => {
            let (rows, cols, _) = rgb.dim();
            full_mask(rows, cols)
        }
    };
    Ok((rgb, mask))
}

/// Pre-process and segment an image
pub fn segment_image(rgb: &RgbImage, mask: &Mask, config: &AciConfig) -> Result<Segmented> {
    let (image, mask) = pre_process(rgb, mask, &config.pre_processing).context("Pre-processing failed")?;
    let segmented = segment(&image, &mask, &config.segmentation).context("Segmentation failed")?;
    Ok(Segmented {
        image,
        mask,
        segmented,
    })
}

/// Index of the relative area in segment labels
pub const AREA_LABEL: usize = 5;

/// Range of the gravity center `(row, col)` in segment labels
pub const CENTER_LABELS: std::ops::Range<usize> = 3..5;

/// Segment labels: average Lab color, gravity center and relative area
pub fn segment_labeling() -> ConcatenatedLabeling {
    ConcatenatedLabeling::default()
        .push(AverageColorLabeling)
        .push(GravityCenterLabeling)
        .push(SegmentAreaLabeling)
}

/// Labeled segmentation graphs of every image of the dataset, characters in
/// manifest order
pub fn load_samples(dir: &Path, config: &AciConfig) -> Result<Vec<Sample>> {
    let manifest = DatasetManifest::load(dir)?;
    let labeling = segment_labeling();
    let mut samples = Vec::with_capacity(manifest.number_of_images());

    for (class, character) in manifest.characters.iter().enumerate() {
        for entry in &character.images {
            let image_path = dir.join(&entry.image);
            let mask_path = entry.mask.as_ref().map(|mask| dir.join(mask));
            let (rgb, mask) = read_image(&image_path, mask_path.as_deref(), manifest.invert_masks)?;
            let segmented = segment_image(&rgb, &mask, config)
                .with_context(|| format!("While processing {}", image_path.display()))?;
            let graph = segmented
                .segmented
                .labeled_graph(&segmented.image, &segmented.mask, &labeling)
                .with_context(|| format!("Failed to label segments of {}", image_path.display()))?;

            log::info!(
                "{}: {} segments for character {}",
                entry.image.display(),
                graph.number_of_vertices(),
                character.name
            );
            samples.push(Sample {
                character: character.name.clone(),
                class,
                image: entry.image.clone(),
                graph,
            });
        }
    }

    Ok(samples)
}
