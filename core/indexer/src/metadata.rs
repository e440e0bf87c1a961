use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::warn;

use mintix_primitives::{Address, Unit};

use crate::client::IndexerClient;
use crate::errors::IndexerError;

/// HTTP gateway substituted for `ipfs://` when rendering images.
pub const DEFAULT_IPFS_GATEWAY: &str =
    "https://crimson-fascinating-vulture-838.mypinata.cloud/ipfs/";

/// Rewrite an `ipfs://CID` URI to a fetchable gateway URL. Anything else
/// passes through untouched.
pub fn normalize_image_uri(uri: &str, gateway: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(cid) => format!("{gateway}{cid}"),
        None => uri.to_string(),
    }
}

/// Wallet-held asset joined with its on-chain metadata.
#[derive(Debug, Clone)]
pub struct AssetInfo {
    pub unit: Unit,
    pub quantity: u64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl IndexerClient {
    /// Every non-lovelace asset held by an address, enriched with metadata.
    ///
    /// Per-asset lookups run concurrently; a failed lookup degrades that
    /// one entry to its bare unit instead of failing the batch.
    pub async fn nfts_for_address(
        &self,
        address: &Address,
        gateway: &str,
    ) -> Result<Vec<AssetInfo>, IndexerError> {
        let utxos = self.address_utxos(address).await?;

        let mut holdings: BTreeMap<Unit, u64> = BTreeMap::new();
        for utxo in utxos {
            for (unit, quantity) in utxo.value.assets {
                *holdings.entry(unit).or_insert(0) += quantity;
            }
        }

        let lookups = holdings.into_iter().map(|(unit, quantity)| async move {
            match self.asset(&unit).await {
                Ok(details) => {
                    let metadata = details.onchain_metadata;
                    AssetInfo {
                        unit,
                        quantity,
                        name: metadata.as_ref().and_then(|m| m.name.clone()),
                        description: metadata.as_ref().and_then(|m| m.description.clone()),
                        image_url: metadata
                            .as_ref()
                            .and_then(|m| m.image.as_deref())
                            .map(|uri| normalize_image_uri(uri, gateway)),
                    }
                }
                Err(e) => {
                    warn!(%unit, error = %e, "asset metadata lookup failed");
                    AssetInfo {
                        unit,
                        quantity,
                        name: None,
                        description: None,
                        image_url: None,
                    }
                }
            }
        });

        Ok(join_all(lookups).await)
    }
}
