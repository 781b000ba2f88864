use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusteringError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusteringError {
    #[error("Cannot find {k} nearest neighbours among {rows} samples")]
    InvalidNeighborCount { k: usize, rows: usize },

    #[error("Cannot form {k} clusters from {samples} samples")]
    InvalidClusterCount { k: usize, samples: usize },

    #[error("Cannot embed {samples} samples of dimension {dimension} into {requested} dimensions")]
    InvalidDimension {
        requested: usize,
        samples: usize,
        dimension: usize,
    },

    #[error("Cannot reconstruct sample {0} from its neighbours")]
    Reconstruction(usize),

    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Spectra error: {0}")]
    Spectra(#[from] aci_spectra::SpectraError),

    #[error("Graph error: {0}")]
    Graph(#[from] aci_graph::GraphError),
}
