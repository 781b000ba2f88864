use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Vertex {vertex} out of range for graph of order {order}")]
    VertexOutOfRange { vertex: usize, order: usize },

    #[error("Element {element} out of range for forest of {size} elements")]
    ElementOutOfRange { element: usize, size: usize },

    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Invalid partition: {0}")]
    InvalidPartition(String),

    #[error("{0}")]
    Other(String),
}
