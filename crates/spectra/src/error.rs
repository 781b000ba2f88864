use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpectraError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectraError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cannot compute {requested} eigenpairs of an operator of order {order}")]
    InvalidEigenCount { requested: usize, order: usize },

    #[error("Matrix is not square ({rows}x{cols})")]
    NotSquare { rows: usize, cols: usize },

    #[error("Triplet ({row}, {col}) out of bounds for a {rows}x{cols} matrix")]
    TripletOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Graph of order {order} too small for {requested} eigenvectors")]
    GraphTooSmall { requested: usize, order: usize },

    #[error("Graph error: {0}")]
    Graph(#[from] aci_graph::GraphError),
}
