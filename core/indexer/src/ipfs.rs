use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::errors::IndexerError;

/// Pinning service configuration (Pinata-style key pair auth).
#[derive(Debug, Clone)]
pub struct PinningConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_secret: String,
}

impl PinningConfig {
    pub fn pinata(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            endpoint: "https://api.pinata.cloud/pinning/pinFileToIPFS".to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

/// Uploads files to IPFS through a pinning service.
pub struct PinningClient {
    http: Client,
    config: PinningConfig,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinningClient {
    pub fn new(config: PinningConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Pin a file and return its `ipfs://CID` URI.
    pub async fn pin_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, IndexerError> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("pinata_api_key", &self.config.api_key)
            .header("pinata_secret_api_key", &self.config.api_secret)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IndexerError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let pinned: PinResponse = response.json().await?;
        info!(cid = %pinned.ipfs_hash, "file pinned");
        Ok(format!("ipfs://{}", pinned.ipfs_hash))
    }
}
