//! # ACI Classify
//!
//! Recognition of animation characters from their labeled segmentation
//! graphs.
//!
//! ## Features
//!
//! - **Vertex kernels** - Gaussian, khi², Kronecker and compound kernels on segment labels
//! - **Tree-walk kernel** - graph kernel over planar segmentation graphs
//! - **Statistical models** - k nearest neighbours and Gaussian naive Bayes
//! - **Spectrum distance classifier** - leave one out evaluation on graph spectra
//! - **Graph classifiers** - multiple feature graph pattern vectors, principal
//!   angles between eigenspaces, Dirichlet eigenvectors around a root segment
//! - **Tree-walk spectral clustering** - whole graphs clustered by their tree-walk kernel
//!
//! ## Architecture
//!
//! ```text
//! LabeledGraph<Vec<f32>> ──> weigh_edges_by_kernel ──> WeightedGraph
//!                                                          │
//!                  MatrixRepresentation (padded) <─────────┘
//!                           │
//!                           └──> exp(-mu λ) ──> TrainableStatModel
//!
//! RootedGraph ──> GraphClassifier (multiple graphs, principal angles, Dirichlet)
//!
//! PlanarGraph ──> tree_walk_kernel ──> spectral_embedding ──> kmeans
//! ```

mod dirichlet;
mod error;
mod graph_classifier;
mod kernels;
mod multiple_graphs;
mod principal_angles;
mod spectrum_distance;
mod stat_model;
mod tree_walk;
mod tree_walk_clustering;

pub use dirichlet::DirichletEigenSubspaceClassifier;
pub use error::{ClassifyError, Result};
pub use graph_classifier::{GraphClassifier, RootedGraph, SubspaceSimilarity};
pub use kernels::{
    dot_product_kernel, euclid_distance, gaussian_kernel, khi2_kernel, kronecker_kernel,
    weigh_edges_by_kernel, CompoundGaussianKernel, DotProductKernel, GaussianKernel, Khi2Kernel,
    KroneckerKernel, TreeWalkBasisKernel, VertexKernel,
};
pub use multiple_graphs::{FeatureSpace, MultipleGraphsClassifier};
pub use principal_angles::PrincipalAnglesClassifier;
pub use spectrum_distance::SpectrumDistanceClassifier;
pub use stat_model::{BayesModel, KNearestModel, TrainableStatModel};
pub use tree_walk::{circular_neighbors, tree_walk_kernel};
pub use tree_walk_clustering::{PlanarGraph, TreeWalkSpectralClustering};
