use serde_json::json;
use tracing::info;

use mintix_datum::NativeScript;
use mintix_indexer::TxSubmitter;
use mintix_primitives::{AssetName, Network, TxHash, Unit, Value};
use mintix_wallet::{Signer, TransactionBuilder};

use crate::errors::MarketError;

/// Metadata label for NFT metadata in the transaction's auxiliary data.
pub const NFT_METADATA_LABEL: u64 = 721;

/// What to mint.
#[derive(Debug, Clone)]
pub struct MintRequest {
    /// Token name, also used as the metadata display name.
    pub name: String,
    pub description: Option<String>,
    /// `ipfs://CID` or HTTP image URI.
    pub image_uri: Option<String>,
    pub quantity: u64,
}

/// Mint an asset under a fresh single-issuer policy that expires at
/// `expiry_slot`, sending it to the minter with label-721 metadata.
///
/// Returns the transaction id and the newly minted unit.
pub async fn mint_nft(
    signer: &dyn Signer,
    submitter: &dyn TxSubmitter,
    network: Network,
    request: MintRequest,
    expiry_slot: u64,
) -> Result<(TxHash, Unit), MarketError> {
    if request.quantity == 0 || request.quantity > i64::MAX as u64 {
        return Err(MarketError::InvalidQuantity(request.quantity));
    }

    let policy = NativeScript::single_issuer_until(signer.key_hash(), expiry_slot);
    let policy_id = policy.policy_id()?;
    let asset_name = AssetName::from_text(&request.name)?;
    let unit = Unit::new(policy_id, asset_name);

    let mut fields = serde_json::Map::new();
    fields.insert("name".to_string(), json!(request.name));
    if let Some(description) = &request.description {
        fields.insert("description".to_string(), json!(description));
    }
    if let Some(image_uri) = &request.image_uri {
        fields.insert("image".to_string(), json!(image_uri));
    }

    let mut tokens = serde_json::Map::new();
    tokens.insert(request.name.clone(), serde_json::Value::Object(fields));
    let mut policies = serde_json::Map::new();
    policies.insert(policy_id.to_string(), serde_json::Value::Object(tokens));
    let metadata = serde_json::Value::Object(policies);

    let tx = TransactionBuilder::new(network)
        .mint_asset(unit.clone(), request.quantity as i64, policy)
        .pay_to_address(
            signer.address(),
            Value::default().with_asset(unit.clone(), request.quantity),
        )
        .attach_metadata(NFT_METADATA_LABEL, metadata.to_string())
        .valid_until(expiry_slot)
        .build()?;

    let signed = signer.sign(tx).await?;
    let tx_hash = submitter
        .submit(&signed.raw)
        .await
        .map_err(|e| MarketError::Submit(e.to_string()))?;

    info!(%unit, quantity = request.quantity, %tx_hash, "mint submitted");
    Ok((tx_hash, unit))
}
