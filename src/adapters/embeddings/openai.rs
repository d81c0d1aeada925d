//! OpenAI embedding provider adapter.
//!
//! Calls the `/embeddings` endpoint of any OpenAI-compatible API
//! (OpenAI, Azure OpenAI, local servers). Used by the vector engine to
//! embed the retrieval plan before similarity search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::EmbeddingProvider;

/// OpenAI embedding provider.
pub struct OpenAiEmbeddingProvider {
    config: EmbeddingConfig,
    client: reqwest::Client,
}

impl OpenAiEmbeddingProvider {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: EmbeddingConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::ExecutionFailed(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn api_key(&self) -> DomainResult<String> {
        self.config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                DomainError::ExecutionFailed(
                    "OpenAI API key not set. Set OPENAI_API_KEY env var or configure embedding.api_key."
                        .to_string(),
                )
            })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        let api_key = self.api_key()?;
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));

        let request_body = EmbeddingsRequest {
            model: &self.config.model,
            input: vec![text],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| DomainError::ExecutionFailed(format!("Embedding API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DomainError::ExecutionFailed(format!(
                "Embedding API returned {status}: {body}"
            )));
        }

        let result: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| DomainError::SerializationError(format!("Failed to parse embedding response: {e}")))?;

        let vector = result
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .ok_or_else(|| DomainError::ExecutionFailed("Empty embedding response".to_string()))?;

        if vector.len() != self.config.dimension {
            tracing::warn!(
                expected = self.config.dimension,
                actual = vector.len(),
                model = %self.config.model,
                "embedding dimension differs from configuration"
            );
        }

        Ok(vector)
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn config_for(url: String) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url: url,
            api_key: Some("test-key".to_string()),
            dimension: 3,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_embed_parses_vector() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/embeddings")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"embedding":[0.1,0.2,0.3],"index":0}]}"#)
            .create_async()
            .await;

        let provider = OpenAiEmbeddingProvider::new(config_for(server.url())).unwrap();
        let vector = provider.embed("hello").await.unwrap();

        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_maps_http_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/embeddings")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let provider = OpenAiEmbeddingProvider::new(config_for(server.url())).unwrap();
        let err = provider.embed("hello").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
