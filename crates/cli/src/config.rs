use aci_classify::{FeatureSpace, GaussianKernel, SubspaceSimilarity, TreeWalkBasisKernel};
use aci_segmentation::{PreProcessingParams, SegmentationParams};
use aci_spectra::MatrixRepresentation;
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "ACI_CONFIG";

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "aci.toml";

/// Effective configuration of the `aci` binary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AciConfig {
    pub segmentation: SegmentationParams,
    pub pre_processing: PreProcessingParams,
    pub spectra: SpectraConfig,
    pub classification: ClassificationConfig,
    pub multiple_graphs: MultipleGraphsConfig,
    pub principal_angles: PrincipalAnglesConfig,
    pub dirichlet: DirichletConfig,
    pub tree_walk: TreeWalkConfig,
}

/// Spectrum distance clustering of segmentation graphs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectraConfig {
    pub matrix_rep: MatrixRepresentation,
    /// Number of non trivial eigenvalues compared
    pub k: usize,
}

impl Default for SpectraConfig {
    fn default() -> Self {
        Self {
            matrix_rep: MatrixRepresentation::NormalizedLaplacian,
            k: 3,
        }
    }
}

/// Spectrum distance classifier over labeled segmentation graphs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub matrix_rep: MatrixRepresentation,
    /// Eigenvalues `λ` are mapped to `exp(-mu * λ)`
    pub mu: f64,
    /// Edge weights between segment labels
    pub kernel: GaussianKernel,
    /// Neighbours voting in the nearest neighbour model
    pub neighbors: usize,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            matrix_rep: MatrixRepresentation::Laplacian,
            mu: 1.0,
            kernel: GaussianKernel { mu: 1.0, sigma: 50.0 },
            neighbors: 1,
        }
    }
}

/// Pattern vectors of color, position and area feature graphs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultipleGraphsConfig {
    /// Eigenvectors per pattern vector
    pub eigenvectors: usize,
    pub color_sigma: f64,
    /// In pixels of the pre-processed image
    pub position_sigma: f64,
    /// Fraction of the foreground
    pub area_sigma: f64,
}

impl Default for MultipleGraphsConfig {
    fn default() -> Self {
        Self {
            eigenvectors: 2,
            color_sigma: 20.0,
            position_sigma: 20.0,
            area_sigma: 0.1,
        }
    }
}

impl MultipleGraphsConfig {
    /// Feature spaces over the `(L, a, b, row, col, area)` segment labels
    pub fn feature_spaces(&self) -> Vec<FeatureSpace> {
        vec![
            FeatureSpace::new(0, 3, self.color_sigma),
            FeatureSpace::new(3, 5, self.position_sigma),
            FeatureSpace::new(5, 6, self.area_sigma),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrincipalAnglesConfig {
    pub similarity: SubspaceSimilarity,
}

/// Dirichlet eigenvectors of subgraphs around the largest segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirichletConfig {
    pub eigenvectors: usize,
    /// Compared subgraph size relative to the smaller graph, in (0, 1)
    pub min_subgraph_size: f64,
    pub similarity: SubspaceSimilarity,
}

impl Default for DirichletConfig {
    fn default() -> Self {
        Self {
            eigenvectors: 2,
            min_subgraph_size: 0.8,
            similarity: SubspaceSimilarity::AverageCosine,
        }
    }
}

/// Tree-walk kernel between planar segmentation graphs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeWalkConfig {
    pub depth: usize,
    pub arity: usize,
    pub kernel: TreeWalkBasisKernel,
}

impl Default for TreeWalkConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            arity: 2,
            kernel: TreeWalkBasisKernel { mu_c: 1e-3, mu_a: 1.0 },
        }
    }
}

impl AciConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Load from the explicit path, then `ACI_CONFIG`, then `aci.toml` in the
    /// working directory. Defaults apply when none of them is set.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => match env::var_os(CONFIG_ENV) {
                Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
                _ => {
                    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                    local.is_file().then_some(local)
                }
            },
        };

        match path {
            Some(path) => {
                log::debug!("loading configuration from {}", path.display());
                Ok((Self::from_file(&path)?, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aci_segmentation::ScaleType;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AciConfig::from_toml(
            r#"
            [segmentation]
            scale = 150.0
            scale_type = "volume"

            [classification.kernel]
            mu = 2.0
            sigma = 5.0
            "#,
        )
        .unwrap();

        assert_eq!(config.segmentation.scale, 150.0);
        assert_eq!(config.segmentation.scale_type, ScaleType::Volume);
        assert_eq!(config.segmentation.max_segments, 20);
        assert_eq!(config.classification.kernel, GaussianKernel { mu: 2.0, sigma: 5.0 });
        assert_eq!(config.classification.neighbors, 1);
        assert_eq!(config.pre_processing, PreProcessingParams::default());
        assert_eq!(config.spectra, SpectraConfig::default());
        assert_eq!(config.tree_walk, TreeWalkConfig::default());
    }

    #[test]
    fn test_graph_classifier_sections() {
        let config = AciConfig::from_toml(
            r#"
            [multiple_graphs]
            position_sigma = 5.0

            [dirichlet]
            similarity = "largest_cosine"

            [tree_walk.kernel]
            mu_c = 0.01
            mu_a = 2.0
            "#,
        )
        .unwrap();

        let features = config.multiple_graphs.feature_spaces();
        assert_eq!(features[1], FeatureSpace::new(3, 5, 5.0));
        assert_eq!(config.multiple_graphs.eigenvectors, 2);
        assert_eq!(config.dirichlet.similarity, SubspaceSimilarity::LargestCosine);
        assert_eq!(config.dirichlet.min_subgraph_size, 0.8);
        assert_eq!(config.principal_angles.similarity, SubspaceSimilarity::AverageCosine);
        assert_eq!(config.tree_walk.kernel, TreeWalkBasisKernel { mu_c: 0.01, mu_a: 2.0 });
        assert_eq!(config.tree_walk.depth, 2);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(AciConfig::from_toml("[segmentation]\nscale = \"large\"").is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AciConfig::load(Some(&dir.path().join("missing.toml"))).is_err());

        let path = dir.path().join("aci.toml");
        fs::write(&path, "[spectra]\nk = 5\n").unwrap();
        let (config, loaded) = AciConfig::load(Some(&path)).unwrap();
        assert_eq!(config.spectra.k, 5);
        assert_eq!(loaded, Some(path));
    }
}
