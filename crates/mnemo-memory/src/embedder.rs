// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini embedding adapter over the Generative Language REST API.
//!
//! All texts of one [`EmbeddingInput`] go out in a single
//! `:batchEmbedContents` request. Failures surface as
//! [`MnemoError::Upstream`] without retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use mnemo_config::model::EmbedderConfig;
use mnemo_core::MnemoError;
use mnemo_core::traits::adapter::PluginAdapter;
use mnemo_core::traits::embedding::EmbeddingAdapter;
use mnemo_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    embeddings: Vec<Values>,
}

#[derive(Deserialize)]
struct Values {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Embedding adapter backed by Gemini `text-embedding` models.
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    /// Creates a new embedder.
    ///
    /// `model` may be given with or without the `models/` prefix.
    pub fn new(
        api_key: &str,
        model: &str,
        dimensions: usize,
        base_url: &str,
    ) -> Result<Self, MnemoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| MnemoError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| MnemoError::upstream("failed to build HTTP client", e))?;

        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        })
    }

    /// Builds the embedder from the `[embedder]` section.
    ///
    /// A missing API key (neither `embedder.api_key` nor `GOOGLE_API_KEY`)
    /// is a configuration error.
    pub fn from_config(config: &EmbedderConfig) -> Result<Self, MnemoError> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            MnemoError::Config(
                "embedder.api_key is not set and GOOGLE_API_KEY is empty".to_string(),
            )
        })?;
        Self::new(&api_key, &config.model, config.dimensions, &config.base_url)
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:batchEmbedContents", self.base_url, self.model)
    }
}

#[async_trait]
impl PluginAdapter for GeminiEmbedder {
    fn name(&self) -> &str {
        "gemini-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for GeminiEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MnemoError> {
        if input.texts.is_empty() {
            return Ok(EmbeddingOutput {
                embeddings: Vec::new(),
                dimensions: self.dimensions,
            });
        }

        let body = BatchRequest {
            requests: input
                .texts
                .iter()
                .map(|text| EmbedRequest {
                    model: &self.model,
                    content: Content {
                        parts: vec![Part { text }],
                    },
                    output_dimensionality: self.dimensions,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| MnemoError::upstream(format!("embedding request failed: {e}"), e))?;

        let status = response.status();
        debug!(status = %status, texts = input.texts.len(), "embedding response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api) => format!(
                    "Gemini API error ({}): {}",
                    api.error.status.as_deref().unwrap_or(status.as_str()),
                    api.error.message
                ),
                Err(_) => format!("embedding API returned {status}: {body}"),
            };
            return Err(MnemoError::Upstream {
                message,
                source: None,
            });
        }

        let parsed: BatchResponse = response
            .json()
            .await
            .map_err(|e| MnemoError::upstream(format!("failed to parse embedding response: {e}"), e))?;

        if parsed.embeddings.len() != input.texts.len() {
            return Err(MnemoError::Upstream {
                message: format!(
                    "embedding API returned {} vectors for {} texts",
                    parsed.embeddings.len(),
                    input.texts.len()
                ),
                source: None,
            });
        }

        Ok(EmbeddingOutput {
            embeddings: parsed.embeddings.into_iter().map(|v| v.values).collect(),
            dimensions: self.dimensions,
        })
    }
}
