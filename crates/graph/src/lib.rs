//! # ACI Graph
//!
//! Weighted graphs and vertex partitions for image segmentation.
//!
//! ## Features
//!
//! - **Weighted graphs** - adjacency lists plus a flat edge list in insertion order
//! - **Labeled graphs** - per-vertex labels on top of a weighted graph
//! - **Disjoint set forests** - union by rank, path compression, component sizes
//! - **Partition utilities** - induced subgraphs, fusion, isolated vertices
//! - **Traversal** - breadth first order and vertex permutations
//!
//! ## Architecture
//!
//! ```text
//! WeightedGraph
//!     │
//!     ├──> connected_components / largest_connected_component
//!     │
//!     ├──> induced_subgraphs ──> partition each subgraph
//!     │                              │
//!     │                              └──> fuse_partitions ──> DisjointSetForest
//!     │
//!     ├──> remove_isolated_vertices ──> segment ──> add_isolated_vertices
//!     │
//!     └──> LabeledGraph<T> (segmentation graphs)
//! ```

mod disjoint_set;
mod error;
mod labeled;
mod partitions;
mod weighted;

pub use disjoint_set::DisjointSetForest;
pub use error::{GraphError, Result};
pub use labeled::LabeledGraph;
pub use partitions::{add_isolated_vertices, fuse_partitions, remove_isolated_vertices};
pub use weighted::{
    breadth_first_order, connected_components, induced_subgraphs, largest_connected_component,
    permute_vertices, Edge, HalfEdge, WeightedGraph,
};
