use mintix_datum::DatumError;
use mintix_indexer::IndexerError;
use mintix_primitives::{Lovelace, PrimitivesError};
use mintix_wallet::WalletError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Validator not found in blueprint: {title}")]
    MissingValidator { title: String },

    #[error("Invalid blueprint: {0}")]
    Blueprint(String),

    #[error("Invalid listing price: {0}")]
    InvalidPrice(Lovelace),

    #[error("Invalid mint quantity: {0}")]
    InvalidQuantity(u64),

    #[error("Only the listing's seller can cancel it")]
    NotSeller,

    #[error("Submission failed: {0}")]
    Submit(String),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Indexer(#[from] IndexerError),

    #[error(transparent)]
    Datum(#[from] DatumError),

    #[error(transparent)]
    Primitives(#[from] PrimitivesError),
}
