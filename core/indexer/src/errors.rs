use mintix_primitives::PrimitivesError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Indexer returned {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Primitives(#[from] PrimitivesError),
}
