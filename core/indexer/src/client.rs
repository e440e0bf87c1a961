use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use mintix_primitives::{Address, OutputRef, TxHash, Unit, Utxo, Value};

use crate::errors::IndexerError;

/// Static project header the indexer authenticates with.
const PROJECT_ID_HEADER: &str = "project_id";

/// Indexer endpoint configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub base_url: String,
    pub project_id: String,
}

impl IndexerConfig {
    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            project_id: project_id.into(),
        }
    }

    pub fn preprod(project_id: impl Into<String>) -> Self {
        Self::new("https://cardano-preprod.blockfrost.io/api/v0", project_id)
    }

    pub fn mainnet(project_id: impl Into<String>) -> Self {
        Self::new("https://cardano-mainnet.blockfrost.io/api/v0", project_id)
    }
}

/// HTTP client for the chain indexer. Every query reflects the current
/// chain tip; nothing is cached and nothing is retried here.
pub struct IndexerClient {
    http: Client,
    config: IndexerConfig,
}

/// UTXO row as the indexer serves it.
#[derive(Debug, Deserialize)]
struct RawUtxo {
    tx_hash: String,
    output_index: u64,
    address: String,
    amount: Vec<RawAmount>,
    #[serde(default)]
    inline_datum: Option<String>,
    #[serde(default)]
    data_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAmount {
    unit: String,
    quantity: String,
}

/// Per-asset record with the on-chain metadata attached at mint time.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetDetails {
    pub asset: String,
    #[serde(default)]
    pub policy_id: Option<String>,
    #[serde(default)]
    pub asset_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub onchain_metadata: Option<OnchainMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OnchainMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDatum {
    cbor: String,
}

impl IndexerClient {
    pub fn new(config: IndexerConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, IndexerError> {
        let url = format!("{}/{}", self.config.base_url, path);
        debug!(%url, "indexer query");

        let response = self
            .http
            .get(&url)
            .header(PROJECT_ID_HEADER, &self.config.project_id)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(IndexerError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IndexerError::Status {
                code: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// All UTXOs currently at an address. An address the chain has never
    /// seen reports as empty rather than an error.
    pub async fn address_utxos(&self, address: &Address) -> Result<Vec<Utxo>, IndexerError> {
        let encoded = address
            .to_bech32()
            .map_err(|e| IndexerError::InvalidResponse(e.to_string()))?;

        let raw: Vec<RawUtxo> = match self.get_json(&format!("addresses/{encoded}/utxos")).await {
            Ok(raw) => raw,
            Err(IndexerError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        raw.into_iter().map(parse_utxo).collect()
    }

    /// On-chain details for one asset unit.
    pub async fn asset(&self, unit: &Unit) -> Result<AssetDetails, IndexerError> {
        self.get_json(&format!("assets/{unit}")).await
    }

    /// Raw CBOR of a datum known only by hash.
    pub async fn datum_cbor(&self, datum_hash: &str) -> Result<Option<Vec<u8>>, IndexerError> {
        match self
            .get_json::<RawDatum>(&format!("scripts/datum/{datum_hash}/cbor"))
            .await
        {
            Ok(raw) => Ok(Some(hex::decode(raw.cbor).map_err(|e| {
                IndexerError::InvalidResponse(format!("datum cbor: {e}"))
            })?)),
            Err(IndexerError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Submit a signed transaction byte stream. A rejection by the node
    /// (lost UTXO race, invalid witness) is terminal for this attempt.
    pub async fn submit_tx(&self, raw_tx: &[u8]) -> Result<TxHash, IndexerError> {
        let url = format!("{}/tx/submit", self.config.base_url);

        let response = self
            .http
            .post(&url)
            .header(PROJECT_ID_HEADER, &self.config.project_id)
            .header("Content-Type", "application/cbor")
            .body(raw_tx.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IndexerError::Rejected(message));
        }

        let tx_hash: String = response.json().await?;
        tx_hash
            .parse()
            .map_err(|_| IndexerError::InvalidResponse(format!("tx hash: {tx_hash}")))
    }
}

fn parse_utxo(raw: RawUtxo) -> Result<Utxo, IndexerError> {
    let tx_hash: TxHash = raw
        .tx_hash
        .parse()
        .map_err(|_| IndexerError::InvalidResponse(format!("tx hash: {}", raw.tx_hash)))?;
    let address = Address::from_bech32(&raw.address)?;

    let mut value = Value::default();
    for amount in raw.amount {
        let quantity: u64 = amount.quantity.parse().map_err(|_| {
            IndexerError::InvalidResponse(format!("quantity: {}", amount.quantity))
        })?;
        if amount.unit == "lovelace" {
            value.lovelace += quantity;
        } else {
            let unit: Unit = amount
                .unit
                .parse()
                .map_err(|_| IndexerError::InvalidResponse(format!("unit: {}", amount.unit)))?;
            value = value.with_asset(unit, quantity);
        }
    }

    let inline_datum = match raw.inline_datum {
        Some(datum_hex) => Some(
            hex::decode(&datum_hex)
                .map_err(|e| IndexerError::InvalidResponse(format!("inline datum: {e}")))?,
        ),
        None => None,
    };

    let mut utxo = Utxo::new(OutputRef::new(tx_hash, raw.output_index), address, value);
    utxo.inline_datum = inline_datum;
    utxo.datum_hash = raw.data_hash;
    Ok(utxo)
}
