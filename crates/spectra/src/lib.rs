//! # ACI Spectra
//!
//! Spectral graph theory toolbox on top of `ndarray`.
//!
//! ## Features
//!
//! - **Sparse matrices** - compressed sparse rows built from triplets
//! - **Graph matrices** - Laplacian and normalized Laplacian, dense or sparse
//! - **Eigen solvers** - cyclic Jacobi for dense matrices, Lanczos for large operators
//! - **Linear systems** - conjugate gradient on any symmetric positive definite operator
//! - **Subspaces** - SVD, Procrustes rotation, principal angles, subspace distance
//! - **Pattern vectors** - permutation invariant graph descriptors
//!
//! ## Architecture
//!
//! ```text
//! WeightedGraph
//!     │
//!     ├──> laplacian / normalized_laplacian ──────> Array2<f64>
//!     │                                                 │
//!     └──> sparse_laplacian ──> CsrMatrix               │
//!                                  │                    │
//!                                  └──> LinearOperator <┘
//!                                          │
//!                                          ├──> symmetric_sparse_eigen_solver
//!                                          └──> conjugate_gradient
//! ```

mod conjugate_gradient;
mod eigen;
mod error;
mod laplacian;
mod operator;
mod pattern;
mod sparse;
mod subspace;
mod svd;

pub use conjugate_gradient::{conjugate_gradient, ConjugateGradientSolution};
pub use eigen::{
    eigen_gap, symmetric_eigen, symmetric_sparse_eigen_solver, tridiagonal_eigen, EigenSelection,
};
pub use error::{Result, SpectraError};
pub use laplacian::{
    laplacian, normalized_laplacian, normalized_sparse_laplacian, sparse_laplacian,
    MatrixRepresentation,
};
pub use operator::LinearOperator;
pub use pattern::{elementary_symmetric_polynomials, pattern_vectors, power_symmetric_polynomials};
pub use sparse::CsrMatrix;
pub use subspace::{
    canonical_angles, null_spaces_intersection, subspace_distance, subspaces_intersection,
    subspaces_rotation, CanonicalAngles,
};
pub use svd::{complete_orthonormal_basis, svd, Svd};
