//! Listing lifecycle against an in-memory chain: list, reconcile, purchase,
//! cancel, and the lost-UTXO race on double purchase.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mintix_indexer::{IndexerError, TxSubmitter, UtxoSource};
use mintix_market::{
    mint_nft, MarketConfig, MarketError, Marketplace, MarketplaceValidator, MintRequest,
};
use mintix_primitives::{
    Address, KeyHash, Network, OutputRef, TxHash, Unit, Utxo, Value,
};
use mintix_wallet::{KeyStore, SignedTransaction, Signer, SoftwareWallet, WalletProvider};

/// UTXO-set-only chain. Submitting a transaction atomically consumes its
/// script inputs and creates its outputs; a consumed input makes any later
/// transaction spending it fail, like the real network resolving a race.
struct MockChain {
    utxos: Mutex<HashMap<OutputRef, Utxo>>,
    seeds: Mutex<u8>,
}

impl MockChain {
    fn new() -> Self {
        Self {
            utxos: Mutex::new(HashMap::new()),
            seeds: Mutex::new(0),
        }
    }

    fn seed(&self, address: &Address, value: Value) {
        let mut seeds = self.seeds.lock().unwrap();
        *seeds += 1;
        let reference = OutputRef::new(TxHash::new([*seeds; 32]), 0);

        self.utxos
            .lock()
            .unwrap()
            .insert(reference, Utxo::new(reference, address.clone(), value));
    }

    fn insert_raw(&self, utxo: Utxo) {
        self.utxos.lock().unwrap().insert(utxo.reference, utxo);
    }
}

#[async_trait]
impl UtxoSource for MockChain {
    async fn utxos_at(&self, address: &Address) -> Result<Vec<Utxo>, IndexerError> {
        Ok(self
            .utxos
            .lock()
            .unwrap()
            .values()
            .filter(|utxo| &utxo.address == address)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TxSubmitter for MockChain {
    async fn submit(&self, raw_tx: &[u8]) -> Result<TxHash, IndexerError> {
        let signed = SignedTransaction::from_raw(raw_tx)
            .map_err(|e| IndexerError::Rejected(e.to_string()))?;
        let tx_hash = signed
            .id()
            .map_err(|e| IndexerError::Rejected(e.to_string()))?;

        let mut utxos = self.utxos.lock().unwrap();

        for input in &signed.transaction.script_inputs {
            if !utxos.contains_key(&input.utxo.reference) {
                return Err(IndexerError::Rejected(format!(
                    "input not in UTXO set: {}",
                    input.utxo.reference
                )));
            }
        }
        for input in &signed.transaction.script_inputs {
            utxos.remove(&input.utxo.reference);
        }

        for (index, output) in signed.transaction.outputs.iter().enumerate() {
            let reference = OutputRef::new(tx_hash, index as u64);
            let mut utxo = Utxo::new(reference, output.address.clone(), output.value.clone());
            utxo.inline_datum = output.inline_datum.clone();
            utxos.insert(reference, utxo);
        }

        Ok(tx_hash)
    }
}

async fn signer_named(dir: &tempfile::TempDir, name: &str) -> Arc<dyn Signer> {
    let mut store = KeyStore::new(dir.path().join(format!("{name}.json"))).unwrap();
    store.generate_key("correct horse", None).unwrap();
    store.unlock("correct horse").unwrap();

    let wallet = SoftwareWallet::new(Network::Testnet, store);
    wallet.enable().await.unwrap()
}

fn marketplace(chain: &Arc<MockChain>) -> Marketplace {
    let validator = MarketplaceValidator::bundled().unwrap();
    let fee_address = Address::from_key_hash(Network::Testnet, KeyHash::new([0xfe; 28]));
    Marketplace::new(
        validator,
        MarketConfig::new(Network::Testnet, fee_address),
        Arc::clone(chain) as Arc<dyn UtxoSource>,
        Arc::clone(chain) as Arc<dyn TxSubmitter>,
    )
}

fn nft_unit() -> Unit {
    format!("{}{}", "ab".repeat(28), hex::encode("Space #1"))
        .parse()
        .unwrap()
}

#[tokio::test]
async fn list_purchase_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let chain = Arc::new(MockChain::new());
    let market = marketplace(&chain);

    let seller = signer_named(&dir, "seller").await;
    let buyer = signer_named(&dir, "buyer").await;
    let unit = nft_unit();

    chain.seed(
        &seller.address(),
        Value::from_lovelace(10_000_000).with_asset(unit.clone(), 1),
    );

    // Unlisted: the wallet owns the asset, the marketplace knows nothing.
    let status = market.status_for(&seller.address(), &unit).await.unwrap();
    assert!(status.is_owner);
    assert!(!status.is_listed);
    assert!(status.price.is_none());

    // Listed: a contract UTXO with the listing datum appears.
    market
        .list_for_sale(seller.as_ref(), &unit, 5_000_000)
        .await
        .unwrap();

    let status = market.status_for(&seller.address(), &unit).await.unwrap();
    assert!(status.is_owner);
    assert!(status.is_listed);
    assert_eq!(status.price, Some(5_000_000));
    let listing = status.listing.expect("listing backs is_listed");
    assert_eq!(listing.datum.seller, seller.key_hash());
    assert_eq!(listing.utxo.value.quantity_of(&unit), 1);
    // The listing output carries the 1% fee amount.
    assert_eq!(listing.utxo.value.lovelace, 50_000);

    // Sold: the purchase consumes the listing UTXO.
    market.purchase(buyer.as_ref(), &listing).await.unwrap();

    let status = market.status_for(&buyer.address(), &unit).await.unwrap();
    assert!(!status.is_listed);
    assert!(status.price.is_none());

    // The seller got paid and the fee address got its cut.
    let seller_utxos = chain.utxos_at(&seller.address()).await.unwrap();
    assert!(seller_utxos
        .iter()
        .any(|utxo| utxo.value.lovelace == 5_000_000));
    let fee_address = Address::from_key_hash(Network::Testnet, KeyHash::new([0xfe; 28]));
    let fee_utxos = chain.utxos_at(&fee_address).await.unwrap();
    assert!(fee_utxos.iter().any(|utxo| utxo.value.lovelace == 50_000));

    // The race loser: spending the now-consumed UTXO is rejected.
    let second = market.purchase(buyer.as_ref(), &listing).await;
    assert!(matches!(second, Err(MarketError::Submit(_))));
}

#[tokio::test]
async fn zero_price_listing_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let chain = Arc::new(MockChain::new());
    let market = marketplace(&chain);
    let seller = signer_named(&dir, "seller").await;

    let result = market.list_for_sale(seller.as_ref(), &nft_unit(), 0).await;
    assert!(matches!(result, Err(MarketError::InvalidPrice(0))));
}

#[tokio::test]
async fn cancel_returns_listing_to_seller() {
    let dir = tempfile::tempdir().unwrap();
    let chain = Arc::new(MockChain::new());
    let market = marketplace(&chain);

    let seller = signer_named(&dir, "seller").await;
    let stranger = signer_named(&dir, "stranger").await;
    let unit = nft_unit();

    chain.seed(
        &seller.address(),
        Value::from_lovelace(10_000_000).with_asset(unit.clone(), 1),
    );
    market
        .list_for_sale(seller.as_ref(), &unit, 3_000_000)
        .await
        .unwrap();

    let status = market.status_for(&seller.address(), &unit).await.unwrap();
    let listing = status.listing.unwrap();

    // Only the seller recorded in the datum may cancel.
    let denied = market.cancel(stranger.as_ref(), &listing).await;
    assert!(matches!(denied, Err(MarketError::NotSeller)));

    market.cancel(seller.as_ref(), &listing).await.unwrap();

    let status = market.status_for(&seller.address(), &unit).await.unwrap();
    assert!(!status.is_listed);
    assert!(market.query().list_utxos().await.unwrap().is_empty());

    // The asset came back to the seller's address.
    let reclaimed = chain.utxos_at(&seller.address()).await.unwrap();
    assert!(reclaimed.iter().any(|utxo| utxo.value.contains(&unit)));
}

#[tokio::test]
async fn foreign_datums_are_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let chain = Arc::new(MockChain::new());
    let market = marketplace(&chain);

    let seller = signer_named(&dir, "seller").await;
    let unit = nft_unit();

    chain.seed(
        &seller.address(),
        Value::from_lovelace(10_000_000).with_asset(unit.clone(), 1),
    );
    market
        .list_for_sale(seller.as_ref(), &unit, 4_000_000)
        .await
        .unwrap();

    // Someone parked unrelated outputs at the contract address: one with
    // garbage datum bytes, one with none at all.
    let contract = market.contract_address().clone();
    chain.insert_raw(
        Utxo::new(
            OutputRef::new(TxHash::new([0xee; 32]), 0),
            contract.clone(),
            Value::from_lovelace(2_000_000),
        )
        .with_inline_datum(vec![0xff, 0x00, 0xba, 0xad]),
    );
    chain.insert_raw(Utxo::new(
        OutputRef::new(TxHash::new([0xee; 32]), 1),
        contract.clone(),
        Value::from_lovelace(1_000_000),
    ));

    assert_eq!(chain.utxos_at(&contract).await.unwrap().len(), 3);

    // Only the real listing survives decoding, without any error.
    let listings = market.query().listings().await.unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].datum.price, 4_000_000);

    let status = market.status_for(&seller.address(), &unit).await.unwrap();
    assert!(status.is_listed);
    assert_eq!(status.price, Some(4_000_000));
}

#[tokio::test]
async fn mint_creates_owned_unit() {
    let dir = tempfile::tempdir().unwrap();
    let chain = Arc::new(MockChain::new());
    let market = marketplace(&chain);
    let minter = signer_named(&dir, "minter").await;

    let request = MintRequest {
        name: "Space #1".to_string(),
        description: Some("First of the series".to_string()),
        image_uri: Some("ipfs://QmSpace1".to_string()),
        quantity: 1,
    };

    let (_, unit) = mint_nft(
        minter.as_ref(),
        chain.as_ref(),
        Network::Testnet,
        request,
        72_000_000,
    )
    .await
    .unwrap();

    let status = market.status_for(&minter.address(), &unit).await.unwrap();
    assert!(status.is_owner);
    assert!(!status.is_listed);

    // Freshly minted assets can go straight to market.
    market
        .list_for_sale(minter.as_ref(), &unit, 9_000_000)
        .await
        .unwrap();
    let status = market.status_for(&minter.address(), &unit).await.unwrap();
    assert_eq!(status.price, Some(9_000_000));
}
