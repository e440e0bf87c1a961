pub mod chain;
pub mod client;
pub mod errors;
pub mod ipfs;
pub mod metadata;

pub use chain::{TxSubmitter, UtxoSource};
pub use client::{AssetDetails, IndexerClient, IndexerConfig, OnchainMetadata};
pub use errors::IndexerError;
pub use ipfs::{PinningClient, PinningConfig};
pub use metadata::{normalize_image_uri, AssetInfo, DEFAULT_IPFS_GATEWAY};
