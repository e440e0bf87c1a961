use mintix_primitives::PrimitivesError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Wallet locked")]
    WalletLocked,

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("No wallet registered under id: {0}")]
    UnknownWallet(String),

    #[error("No wallet connected")]
    NotConnected,

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error(transparent)]
    Primitives(#[from] PrimitivesError),

    #[error("Other error: {0}")]
    Other(String),
}
