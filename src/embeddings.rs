//! Embedding backends behind a common async provider trait.
//!
//! [`HttpEmbeddingProvider`] talks to OpenAI-compatible `/embeddings`
//! endpoints; [`MockEmbeddingProvider`] produces deterministic vectors for
//! tests and offline runs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::PipelineError;

/// Converts a batch of text chunks into fixed-dimension vectors.
///
/// Implementations preserve input order and return exactly one vector per
/// input. An empty batch yields an empty result, never an error.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;

    /// Identifier of the underlying model, for logs.
    fn id(&self) -> &str;
}

/// Embeddings client for OpenAI-compatible REST endpoints.
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: String,
    model: String,
}

impl HttpEmbeddingProvider {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|err| PipelineError::Embedding(format!("invalid api key: {err}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .use_rustls_tls()
            .build()
            .map_err(|err| PipelineError::Embedding(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| PipelineError::Embedding(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(PipelineError::Embedding(format!(
                "embeddings request failed ({status}): {body}"
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::Embedding(err.to_string()))?;
        parsed.data.sort_by_key(|entry| entry.index);
        if parsed.data.len() != texts.len() {
            return Err(PipelineError::Embedding(format!(
                "backend returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        debug!(count = texts.len(), model = %self.model, "embedded chunk batch");
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }

    fn id(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Deterministic embedding provider for tests.
///
/// Vectors are derived from a hash of the input text, so identical texts
/// always map to identical vectors and distinct texts diverge, without any
/// network access.
pub struct MockEmbeddingProvider {
    dim: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dim: 8 }
    }

    pub fn with_dim(dim: usize) -> Self {
        Self { dim }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut state = 0xcbf2_9ce4_8422_2325u64;
        for byte in text.bytes() {
            state ^= u64::from(byte);
            state = state.wrapping_mul(0x100_0000_01b3);
        }
        (0..self.dim)
            .map(|_| {
                // xorshift64
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                ((state % 2000) as f32 / 1000.0) - 1.0
            })
            .collect()
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }

    fn id(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_is_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let inputs = vec!["hello".to_string(), "world".to_string(), "hello".to_string()];
        let first = provider.embed_batch(&inputs).await.unwrap();
        let second = provider.embed_batch(&inputs).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0], first[2]);
        assert_ne!(first[0], first[1]);
    }

    #[tokio::test]
    async fn mock_preserves_order_and_dimension() {
        let provider = MockEmbeddingProvider::with_dim(16);
        let inputs = vec!["a".to_string(), "b".to_string()];
        let vectors = provider.embed_batch(&inputs).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|vector| vector.len() == 16));
    }

    #[tokio::test]
    async fn empty_batch_is_empty_not_error() {
        let provider = MockEmbeddingProvider::new();
        let vectors = provider.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
