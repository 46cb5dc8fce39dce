use async_trait::async_trait;
use serde::Deserialize;

use crate::KnowledgeSettings;
use crate::errors::{KnowledgeError, KnowledgeResult};

/// Text to fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> KnowledgeResult<Vec<f32>>;
}

#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    expected_dim: Option<usize>,
    client: reqwest::Client,
}

impl EmbeddingClient {
    pub fn new(settings: &KnowledgeSettings) -> Self {
        Self {
            base_url: settings.embedding_url.trim_end_matches('/').to_string(),
            model: settings.embedding_model.clone(),
            expected_dim: settings.embedding_dim,
            client: reqwest::Client::new(),
        }
    }

    pub async fn embed_batch(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let body = EmbedRequest {
            model: self.model.clone(),
            input: inputs.to_vec(),
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::Embedding(format!(
                "embedding request failed: {status} {text}"
            )));
        }

        let payload: EmbedResponse = response.json().await?;

        let vectors = if let Some(embeddings) = payload.embeddings {
            embeddings
        } else if let Some(embedding) = payload.embedding {
            vec![embedding]
        } else {
            return Err(KnowledgeError::Embedding(
                "embedding response missing vectors".to_string(),
            ));
        };

        if let Some(expected) = self.expected_dim {
            if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
                return Err(KnowledgeError::EmbeddingDimMismatch {
                    expected,
                    actual: bad.len(),
                });
            }
        }

        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> KnowledgeResult<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| KnowledgeError::Embedding("embedding response was empty".to_string()))
    }
}

#[derive(Debug, Clone, serde::Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Option<Vec<Vec<f32>>>,
    embedding: Option<Vec<f32>>,
}
