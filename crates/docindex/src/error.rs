use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocIndexError>;

#[derive(Error, Debug)]
pub enum DocIndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Invalid entry {index}: {message}")]
    InvalidEntry { index: usize, message: String },
}
