use std::sync::Arc;
use tracing::info;

use mintix_datum::{ListingDatum, PlutusData};
use mintix_indexer::{TxSubmitter, UtxoSource};
use mintix_primitives::{Address, Lovelace, Network, TxHash, Unit, Value};
use mintix_wallet::{Signer, TransactionBuilder};

use crate::errors::MarketError;
use crate::fee::marketplace_fee;
use crate::query::{Listing, MarketplaceQuery};
use crate::reconcile::{reconcile_unit, ListingStatus};
use crate::validator::MarketplaceValidator;

/// Fee address for the preprod deployment.
const PREPROD_FEE_ADDRESS: &str = "addr_test1qr6f780g8wj7su0v6lr4pqp4w5l5947gcq45d60cl0xd2txkuxdtp7znxpl0kflxpt8z0eqauckttc7zk75gvu5s8dcqj250mt";

/// Marketplace deployment parameters.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub network: Network,
    /// Address the fixed marketplace fee is paid to on purchases.
    pub fee_address: Address,
}

impl MarketConfig {
    pub fn new(network: Network, fee_address: Address) -> Self {
        Self {
            network,
            fee_address,
        }
    }

    pub fn preprod() -> Result<Self, MarketError> {
        Ok(Self::new(
            Network::Testnet,
            Address::from_bech32(PREPROD_FEE_ADDRESS)?,
        ))
    }
}

/// Builds, signs and submits marketplace transactions.
///
/// Ownership is not checked at build time; the signing wallet refuses
/// spends it cannot witness. No submission is ever retried here: when two
/// buyers race for the same listing UTXO the chain accepts one transaction
/// and the other surfaces as a submission error for the caller to handle.
pub struct Marketplace {
    validator: MarketplaceValidator,
    query: MarketplaceQuery,
    config: MarketConfig,
    chain: Arc<dyn UtxoSource>,
    submitter: Arc<dyn TxSubmitter>,
}

impl Marketplace {
    pub fn new(
        validator: MarketplaceValidator,
        config: MarketConfig,
        chain: Arc<dyn UtxoSource>,
        submitter: Arc<dyn TxSubmitter>,
    ) -> Self {
        let query = MarketplaceQuery::new(&validator, config.network, Arc::clone(&chain));
        Self {
            validator,
            query,
            config,
            chain,
            submitter,
        }
    }

    pub fn query(&self) -> &MarketplaceQuery {
        &self.query
    }

    pub fn contract_address(&self) -> &Address {
        self.query.contract_address()
    }

    /// Current listings joined with fresh wallet state for one unit.
    pub async fn status_for(
        &self,
        wallet_address: &Address,
        unit: &Unit,
    ) -> Result<ListingStatus, MarketError> {
        let wallet_utxos = self.chain.utxos_at(wallet_address).await?;
        let listings = self.query.listings().await?;
        Ok(reconcile_unit(unit, &wallet_utxos, &listings))
    }

    /// List an asset for sale: pay the asset plus the fee amount to the
    /// contract, tagged with the listing record as inline datum.
    pub async fn list_for_sale(
        &self,
        signer: &dyn Signer,
        unit: &Unit,
        price: Lovelace,
    ) -> Result<TxHash, MarketError> {
        if price == 0 {
            return Err(MarketError::InvalidPrice(price));
        }

        let datum = ListingDatum::new(unit, signer.key_hash(), price);
        let fee = marketplace_fee(price);

        let tx = TransactionBuilder::new(self.config.network)
            .pay_to_contract(
                self.contract_address().clone(),
                datum.to_bytes()?,
                Value::from_lovelace(fee).with_asset(unit.clone(), 1),
            )
            .build()?;

        let signed = signer.sign(tx).await?;
        let tx_hash = self
            .submitter
            .submit(&signed.raw)
            .await
            .map_err(|e| MarketError::Submit(e.to_string()))?;

        info!(%unit, price, %tx_hash, "listing submitted");
        Ok(tx_hash)
    }

    /// Buy a listed asset: pay the seller the listed price, pay the
    /// marketplace fee, and collect the listing UTXO with the void
    /// redeemer under the spending validator.
    pub async fn purchase(
        &self,
        signer: &dyn Signer,
        listing: &Listing,
    ) -> Result<TxHash, MarketError> {
        let price = listing.datum.price;
        let fee = marketplace_fee(price);
        let seller_address = Address::from_key_hash(self.config.network, listing.datum.seller);

        let tx = TransactionBuilder::new(self.config.network)
            .pay_to_address(seller_address, Value::from_lovelace(price))
            .pay_to_address(self.config.fee_address.clone(), Value::from_lovelace(fee))
            .collect_from(vec![listing.utxo.clone()], PlutusData::void().to_bytes()?)
            .attach_spending_validator(self.validator.script().clone())
            .build()?;

        let signed = signer.sign(tx).await?;
        let tx_hash = self
            .submitter
            .submit(&signed.raw)
            .await
            .map_err(|e| MarketError::Submit(e.to_string()))?;

        info!(unit = %listing.datum.unit(), price, %tx_hash, "purchase submitted");
        Ok(tx_hash)
    }

    /// Take a listing down: collect the listing UTXO back to the seller.
    /// Only the datum's seller can build this transaction.
    pub async fn cancel(
        &self,
        signer: &dyn Signer,
        listing: &Listing,
    ) -> Result<TxHash, MarketError> {
        if signer.key_hash() != listing.datum.seller {
            return Err(MarketError::NotSeller);
        }

        let seller_address = Address::from_key_hash(self.config.network, listing.datum.seller);

        let tx = TransactionBuilder::new(self.config.network)
            .pay_to_address(seller_address, listing.utxo.value.clone())
            .collect_from(vec![listing.utxo.clone()], PlutusData::void().to_bytes()?)
            .attach_spending_validator(self.validator.script().clone())
            .build()?;

        let signed = signer.sign(tx).await?;
        let tx_hash = self
            .submitter
            .submit(&signed.raw)
            .await
            .map_err(|e| MarketError::Submit(e.to_string()))?;

        info!(unit = %listing.datum.unit(), %tx_hash, "listing cancelled");
        Ok(tx_hash)
    }
}
