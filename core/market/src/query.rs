use std::sync::Arc;
use tracing::debug;

use mintix_datum::ListingDatum;
use mintix_indexer::UtxoSource;
use mintix_primitives::{Address, Network, Utxo};

use crate::errors::MarketError;
use crate::validator::MarketplaceValidator;

/// A contract UTXO paired with its decoded listing record.
#[derive(Debug, Clone)]
pub struct Listing {
    pub utxo: Utxo,
    pub datum: ListingDatum,
}

/// Live view of the marketplace contract address.
///
/// The address is derived once from the validator; every query afterwards
/// hits the chain source directly, so results always reflect the current
/// tip. Indexer failures propagate to the caller unretried.
pub struct MarketplaceQuery {
    contract_address: Address,
    chain: Arc<dyn UtxoSource>,
}

impl MarketplaceQuery {
    pub fn new(
        validator: &MarketplaceValidator,
        network: Network,
        chain: Arc<dyn UtxoSource>,
    ) -> Self {
        Self {
            contract_address: validator.address(network),
            chain,
        }
    }

    pub fn contract_address(&self) -> &Address {
        &self.contract_address
    }

    /// All UTXOs currently at the contract address.
    pub async fn list_utxos(&self) -> Result<Vec<Utxo>, MarketError> {
        Ok(self.chain.utxos_at(&self.contract_address).await?)
    }

    /// Contract UTXOs with decodable listing datums. Outputs carrying a
    /// foreign or malformed datum are not marketplace listings and are
    /// skipped, never surfaced as errors.
    pub async fn listings(&self) -> Result<Vec<Listing>, MarketError> {
        let utxos = self.list_utxos().await?;
        let mut listings = Vec::with_capacity(utxos.len());

        for utxo in utxos {
            let datum_bytes = match &utxo.inline_datum {
                Some(bytes) => Some(bytes.clone()),
                None => match &utxo.datum_hash {
                    Some(hash) => self.chain.datum_bytes(hash).await?,
                    None => None,
                },
            };

            let Some(datum_bytes) = datum_bytes else {
                debug!(reference = %utxo.reference, "contract UTXO without datum, skipping");
                continue;
            };

            match ListingDatum::from_bytes(&datum_bytes) {
                Ok(datum) => listings.push(Listing { utxo, datum }),
                Err(e) => {
                    debug!(reference = %utxo.reference, error = %e, "undecodable datum, skipping");
                }
            }
        }

        Ok(listings)
    }
}
