use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatumError {
    #[error("CBOR error: {0}")]
    Cbor(String),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Integer out of range for this codec")]
    IntOutOfRange,

    #[error("Unsupported CBOR tag: {0}")]
    UnsupportedTag(u64),

    #[error("Unexpected datum shape: {0}")]
    Shape(String),
}
