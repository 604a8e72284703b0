use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no classifier artifact at {0:?}")]
    NotFound(std::path::PathBuf),

    #[error("malformed classifier artifact: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
