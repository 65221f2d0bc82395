use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error at row {row}, field '{field}': {message}")]
    Validation {
        row: usize,
        field: &'static str,
        message: String,
    },

    #[error("No successful run recorded")]
    NoSuccessfulRun,

    #[error("Run {0} not found")]
    RunNotFound(i64),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EtlResult<T> = Result<T, EtlError>;
