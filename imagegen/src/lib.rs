//! Client for the companion image-generation endpoint: proxies prompts to a
//! hosted inference API with a model-dependent timeout, and signals when a
//! timed-out request could be retried on the cheaper fallback model.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Preferred model, tried first.
const PRIMARY_MODEL: &str = "black-forest-labs/FLUX.1-dev";
/// Cheaper model offered after a primary timeout.
const FALLBACK_MODEL: &str = "stabilityai/stable-diffusion-xl-base-1.0";

const PRIMARY_TIMEOUT: Duration = Duration::from_secs(90);
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum ImageGenError {
    #[error("Prompt is required")]
    EmptyPrompt,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Inference API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Image generation timed out after {seconds}s")]
    Timeout {
        seconds: u64,
        /// True when retrying on the fallback model is still an option.
        can_use_fallback: bool,
    },

    #[error("Unexpected response from model: {0}")]
    UnexpectedResponse(String),
}

/// Which backend a request ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Primary,
    Fallback,
}

impl Model {
    pub fn select(use_fallback: bool) -> Self {
        if use_fallback {
            Model::Fallback
        } else {
            Model::Primary
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Model::Primary => PRIMARY_MODEL,
            Model::Fallback => FALLBACK_MODEL,
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            Model::Primary => PRIMARY_TIMEOUT,
            Model::Fallback => FALLBACK_TIMEOUT,
        }
    }
}

/// A generated image as a data URI, with the model that produced it.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub data_uri: String,
    pub model: &'static str,
}

#[derive(Debug, Clone)]
pub struct ImageGenConfig {
    pub base_url: String,
    pub api_key: String,
}

impl ImageGenConfig {
    pub fn hosted(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

pub struct ImageGenClient {
    http: reqwest::Client,
    config: ImageGenConfig,
}

impl ImageGenClient {
    pub fn new(config: ImageGenConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Generate an image for a prompt. The request is aborted after the
    /// model's time budget; a primary-model timeout carries the hint that
    /// the fallback model is still worth trying.
    pub async fn generate(
        &self,
        prompt: &str,
        use_fallback: bool,
    ) -> Result<GeneratedImage, ImageGenError> {
        if prompt.trim().is_empty() {
            return Err(ImageGenError::EmptyPrompt);
        }

        let model = Model::select(use_fallback);
        info!(model = model.id(), timeout_s = model.timeout().as_secs(), "generating image");

        let request = self
            .http
            .post(format!("{}/{}", self.config.base_url, model.id()))
            .bearer_auth(&self.config.api_key)
            .json(&InferenceRequest { inputs: prompt })
            .send();

        let response = match tokio::time::timeout(model.timeout(), request).await {
            Ok(response) => response?,
            Err(_) => {
                return Err(ImageGenError::Timeout {
                    seconds: model.timeout().as_secs(),
                    can_use_fallback: model == Model::Primary,
                })
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ImageGenError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains("application/json") {
            // Some models answer with JSON: a direct image URL, or an error.
            let body: serde_json::Value = response.json().await?;
            return parse_json_response(body, model);
        }

        // The common case: raw image bytes.
        let bytes = response.bytes().await?;
        Ok(GeneratedImage {
            data_uri: image_data_uri(&bytes),
            model: model.id(),
        })
    }
}

fn parse_json_response(
    body: serde_json::Value,
    model: Model,
) -> Result<GeneratedImage, ImageGenError> {
    if let Some(url) = body.as_str() {
        if url.starts_with("http") {
            return Ok(GeneratedImage {
                data_uri: url.to_string(),
                model: model.id(),
            });
        }
    }
    if let Some(error) = body.get("error") {
        return Err(ImageGenError::UnexpectedResponse(error.to_string()));
    }
    Err(ImageGenError::UnexpectedResponse(body.to_string()))
}

fn image_data_uri(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_selection_and_budgets() {
        assert_eq!(Model::select(false), Model::Primary);
        assert_eq!(Model::select(true), Model::Fallback);
        assert_eq!(Model::Primary.timeout(), Duration::from_secs(90));
        assert_eq!(Model::Fallback.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn data_uri_shape() {
        let uri = image_data_uri(&[0xff, 0xd8, 0xff]);
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!(uri, "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn json_url_passthrough() {
        let body = serde_json::json!("https://cdn.example/image.png");
        let image = parse_json_response(body, Model::Fallback).unwrap();
        assert_eq!(image.data_uri, "https://cdn.example/image.png");
        assert_eq!(image.model, FALLBACK_MODEL);
    }

    #[test]
    fn json_error_surfaces() {
        let body = serde_json::json!({ "error": "model is loading" });
        assert!(matches!(
            parse_json_response(body, Model::Primary),
            Err(ImageGenError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn timeout_error_carries_fallback_hint() {
        let primary = ImageGenError::Timeout {
            seconds: 90,
            can_use_fallback: true,
        };
        assert!(primary.to_string().contains("90"));
    }
}
