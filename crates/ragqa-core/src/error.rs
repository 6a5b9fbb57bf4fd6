use thiserror::Error;

/// Errors raised by the retrieval pipeline.
///
/// Each stage raises synchronously and callers propagate unchanged; nothing
/// in the pipeline retries or degrades to a partial index.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index error: {0}")]
    Index(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures produced by the embedding stage.
    pub fn is_embedding(&self) -> bool {
        matches!(self, Self::Embedding(_) | Self::DimensionMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
