use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provisioning error in unit '{unit}': {source}")]
    Provisioning {
        unit: String,
        #[source]
        source: Box<RuntimeError>,
    },

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Reclamation error: {0}")]
    Reclamation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
