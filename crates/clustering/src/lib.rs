//! # ACI Clustering
//!
//! Clustering of samples through their similarity graph, and of whole graphs
//! through their spectrum.
//!
//! ## Features
//!
//! - **Similarity matrices** - dense, masked, or computed on demand
//! - **Similarity graphs** - neighborhood, k nearest, mutual k nearest, complete
//! - **K-means** - deterministic seeding, best of several attempts
//! - **Spectral clustering** - Laplacian eigenvectors followed by k-means
//! - **Spectrum clustering** - graphs grouped by their smallest eigenvalues
//! - **Locally linear embedding** - neighbourhood preserving dimension reduction
//!
//! ## Architecture
//!
//! ```text
//! SimilarityMatrix ──> SimilarityGraphRepresentation ──> WeightedGraph
//!                                                            │
//!                                   graph_spectral_embedding <┘
//!                                              │
//!                                              └──> kmeans ──> labels
//!
//! [WeightedGraph] ──> SpectrumDistanceClustering ──> kmeans ──> labels
//! ```

mod error;
mod kmeans;
mod lle;
mod similarity;
mod similarity_graphs;
mod spectral;
mod spectrum_clustering;

pub use error::{ClusteringError, Result};
pub use kmeans::{kmeans, KMeansResult};
pub use lle::locally_linear_embedding;
pub use similarity::{
    DenseSimilarityMatrix, FunctionSimilarityMatrix, MaskedSimilarityMatrix, SimilarityMatrix,
};
pub use similarity_graphs::{
    similarity_knn, CompleteGraph, KNearestGraph, MaskedGraph, MutualKNearestGraph,
    NeighborhoodGraph, SimilarityGraphRepresentation,
};
pub use spectral::{graph_spectral_embedding, spectral_clustering, spectral_embedding};
pub use spectrum_clustering::SpectrumDistanceClustering;
