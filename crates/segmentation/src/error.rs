use thiserror::Error;

pub type Result<T> = std::result::Result<T, SegmentationError>;

#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid Netpbm data: {0}")]
    Netpbm(String),

    #[error("Image is {image_rows}x{image_cols} but mask is {mask_rows}x{mask_cols}")]
    MaskMismatch {
        image_rows: usize,
        image_cols: usize,
        mask_rows: usize,
        mask_cols: usize,
    },

    #[error("Expected 3 color channels, got {0}")]
    ChannelCount(usize),

    #[error("Mask has no foreground pixel")]
    EmptyMask,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Graph error: {0}")]
    Graph(#[from] aci_graph::GraphError),

    #[error("Spectra error: {0}")]
    Spectra(#[from] aci_spectra::SpectraError),

    #[error("Clustering error: {0}")]
    Clustering(#[from] aci_clustering::ClusteringError),
}
