use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrimitivesError {
    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid asset unit: {0}")]
    InvalidUnit(String),

    #[error("Asset name too long: {0} bytes (max 32)")]
    AssetNameTooLong(usize),

    #[error("Bech32 error: {0}")]
    Bech32(String),

    #[error("Unknown address type: 0x{0:02x}")]
    UnknownAddressType(u8),

    #[error("Address network mismatch: expected {expected}, got {got}")]
    NetworkMismatch { expected: String, got: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}
