//! Embedding provider abstraction and implementations.
//!
//! Defines the [`EmbeddingProvider`] trait and two concrete backends:
//! - **`LocalProvider`** — runs a sentence-embedding model locally via
//!   fastembed (feature `local-embeddings`); deterministic for a given
//!   model version, no network calls after the initial model download.
//! - **[`OpenAIProvider`]** — calls the OpenAI embeddings API with all
//!   texts batched into a single request.
//!
//! Remote calls carry a per-call timeout. A timeout is surfaced as
//! [`RagError::UpstreamTimeout`], every other transport or API failure as
//! [`RagError::UpstreamFailure`]. Neither is retried here; retry policy
//! belongs to the caller.
//!
//! Use [`create_provider`] to instantiate a provider from configuration.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{RagError, Result};

/// A capability that converts text into fixed-dimension vectors.
///
/// One vector per input text, order-preserving. The dimensionality is
/// fixed for the lifetime of a provider instance; mixing providers of
/// different dimensionality across index build and query is a caller
/// error and is rejected by the index as `DimensionMismatch`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier (e.g. `"all-minilm-l6-v2"`, `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embedding vector dimensionality (e.g. `384`, `1536`).
    fn dims(&self) -> usize;

    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

// ============ OpenAI Provider ============

/// Embedding provider backed by `POST https://api.openai.com/v1/embeddings`.
///
/// Batches the whole input into one request. Requires the
/// `OPENAI_API_KEY` environment variable.
pub struct OpenAIProvider {
    model: String,
    dims: usize,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAIProvider {
    /// Create a provider from configuration.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `model`/`dims` are unset or
    /// `OPENAI_API_KEY` is missing from the environment.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config.model.clone().ok_or_else(|| {
            RagError::InvalidConfiguration("embedding.model required for openai provider".into())
        })?;
        let dims = config.dims.ok_or_else(|| {
            RagError::InvalidConfiguration("embedding.dims required for openai provider".into())
        })?;
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::InvalidConfiguration("OPENAI_API_KEY environment variable not set".into())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| upstream_failure("openai embeddings", e.to_string()))?;

        Ok(Self {
            model,
            dims,
            api_key,
            client,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_reqwest("openai embeddings", self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(upstream_failure(
                "openai embeddings",
                format!("HTTP {}: {}", status, body_text),
            ));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| classify_reqwest("openai embeddings", self.timeout_secs, e))?;

        let embeddings = parse_openai_response(&json)?;

        if embeddings.len() != texts.len() {
            return Err(upstream_failure(
                "openai embeddings",
                format!("expected {} embeddings, got {}", texts.len(), embeddings.len()),
            ));
        }

        Ok(embeddings)
    }
}

/// Extract the `data[].embedding` arrays from an OpenAI response, in order.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| upstream_failure("openai embeddings", "missing data array".to_string()))?;

    let mut embeddings = Vec::with_capacity(data.len());

    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                upstream_failure("openai embeddings", "missing embedding field".to_string())
            })?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| {
                v.as_f64().map(|f| f as f32).ok_or_else(|| {
                    upstream_failure(
                        "openai embeddings",
                        format!("non-numeric value in embedding array: {}", v),
                    )
                })
            })
            .collect::<Result<_>>()?;

        embeddings.push(vec);
    }

    Ok(embeddings)
}

fn classify_reqwest(service: &str, timeout_secs: u64, e: reqwest::Error) -> RagError {
    if e.is_timeout() {
        RagError::UpstreamTimeout {
            service: service.to_string(),
            timeout_secs,
        }
    } else {
        upstream_failure(service, e.to_string())
    }
}

fn upstream_failure(service: &str, message: impl Into<String>) -> RagError {
    RagError::UpstreamFailure {
        service: service.to_string(),
        message: message.into(),
    }
}

// ============ Local Provider (fastembed) ============

/// Embedding provider for local inference via fastembed.
///
/// Models are downloaded on first use from Hugging Face and cached;
/// afterwards embedding runs entirely offline inside `spawn_blocking`.
#[cfg(feature = "local-embeddings")]
pub struct LocalProvider {
    model_name: String,
    dims: usize,
    batch_size: usize,
}

#[cfg(feature = "local-embeddings")]
impl LocalProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_name = config
            .model
            .clone()
            .unwrap_or_else(|| "all-minilm-l6-v2".to_string());

        // Validate the model name up front so a typo fails at construction,
        // not mid-pipeline.
        config_to_fastembed_model(&model_name)?;

        let dims = config.dims.unwrap_or(match model_name.as_str() {
            "all-minilm-l6-v2" => 384,
            "bge-small-en-v1.5" => 384,
            "bge-base-en-v1.5" => 768,
            "bge-large-en-v1.5" => 1024,
            _ => 384,
        });

        Ok(Self {
            model_name,
            dims,
            batch_size: config.batch_size,
        })
    }
}

#[cfg(feature = "local-embeddings")]
fn config_to_fastembed_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
        other => Err(RagError::InvalidConfiguration(format!(
            "unknown local embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5",
            other
        ))),
    }
}

#[cfg(feature = "local-embeddings")]
#[async_trait]
impl EmbeddingProvider for LocalProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = config_to_fastembed_model(&self.model_name)?;
        let batch_size = self.batch_size;
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut embedder = fastembed::TextEmbedding::try_new(
                fastembed::InitOptions::new(model).with_show_download_progress(false),
            )
            .map_err(|e| {
                upstream_failure("local embeddings", format!("model init failed: {}", e))
            })?;

            embedder
                .embed(texts, Some(batch_size))
                .map_err(|e| upstream_failure("local embeddings", e.to_string()))
        })
        .await
        .map_err(|e| upstream_failure("local embeddings", format!("task panicked: {}", e)))?
    }
}

/// Create the appropriate [`EmbeddingProvider`] based on configuration.
///
/// | Config value | Provider |
/// |--------------|----------|
/// | `"local"` | `LocalProvider` (requires feature `local-embeddings`) |
/// | `"openai"` | [`OpenAIProvider`] |
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAIProvider::new(config)?)),
        #[cfg(feature = "local-embeddings")]
        "local" => Ok(Box::new(LocalProvider::new(config)?)),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => Err(RagError::InvalidConfiguration(
            "local embedding provider requires --features local-embeddings".to_string(),
        )),
        other => Err(RagError::InvalidConfiguration(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}
