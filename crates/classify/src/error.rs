use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClassifyError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("Model used before training")]
    NotTrained,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Vertex {0} has no label")]
    UnlabeledVertex(usize),

    #[error("Label of dimension {actual} where {expected} is expected")]
    LabelDimension { expected: usize, actual: usize },

    #[error("Spectra error: {0}")]
    Spectra(#[from] aci_spectra::SpectraError),

    #[error("Clustering error: {0}")]
    Clustering(#[from] aci_clustering::ClusteringError),

    #[error("Graph error: {0}")]
    Graph(#[from] aci_graph::GraphError),
}
