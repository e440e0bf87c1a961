use async_trait::async_trait;

use mintix_primitives::{Address, TxHash, Utxo};

use crate::client::IndexerClient;
use crate::errors::IndexerError;

/// Live view of the UTXO set at an address. Implemented by the indexer
/// client and by in-memory chains in tests.
#[async_trait]
pub trait UtxoSource: Send + Sync {
    async fn utxos_at(&self, address: &Address) -> Result<Vec<Utxo>, IndexerError>;

    /// Resolve a datum by hash for outputs that don't carry it inline.
    async fn datum_bytes(&self, _datum_hash: &str) -> Result<Option<Vec<u8>>, IndexerError> {
        Ok(None)
    }
}

/// Accepts a signed transaction byte stream for inclusion in the chain.
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn submit(&self, raw_tx: &[u8]) -> Result<TxHash, IndexerError>;
}

#[async_trait]
impl UtxoSource for IndexerClient {
    async fn utxos_at(&self, address: &Address) -> Result<Vec<Utxo>, IndexerError> {
        self.address_utxos(address).await
    }

    async fn datum_bytes(&self, datum_hash: &str) -> Result<Option<Vec<u8>>, IndexerError> {
        self.datum_cbor(datum_hash).await
    }
}

#[async_trait]
impl TxSubmitter for IndexerClient {
    async fn submit(&self, raw_tx: &[u8]) -> Result<TxHash, IndexerError> {
        self.submit_tx(raw_tx).await
    }
}
