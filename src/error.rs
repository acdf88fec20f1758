use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Usage: {0} <M_rows> <N_inner> <Q_cols>")]
    Usage(String),

    #[error("{0}")]
    Configuration(String),

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Array shape error: {0}")]
    ArrayShape(#[from] ndarray::ShapeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Errors every rank detects on its own before any message is exchanged.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Usage(_) | Error::Configuration(_))
    }
}
