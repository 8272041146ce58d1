//! Pluggable embedding providers for the semantic similarity signal.
//!
//! Provides a trait-based abstraction over embedding models, with
//! implementations for a local hashed bag-of-words model (always available),
//! the Ollama API, and the OpenAI embeddings API. Remote failures surface as
//! [`SignalError::Embedding`]; they are never replaced by zero vectors.

use crate::config::EmbeddingConfig;
use crate::error::{ConfigError, SignalError};
use async_trait::async_trait;
use std::collections::HashMap;

/// Trait for embedding providers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Encode a batch of texts into equal-length vectors, one per input.
    async fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SignalError>;

    /// Return the provider name.
    fn provider_name(&self) -> &str;
}

/// Local hashed bag-of-words embedder (no external dependencies).
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dimensions: usize,
}

impl LocalEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lowered = text.to_lowercase();
        let mut tf: HashMap<&str, usize> = HashMap::new();
        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            *tf.entry(word).or_insert(0) += 1;
        }

        for (term, count) in &tf {
            let idx = simple_hash(term) % self.dimensions;
            vector[idx] += *count as f32;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
    }
}

/// djb2 string hash.
fn simple_hash(s: &str) -> usize {
    let mut hash: usize = 5381;
    for b in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(b as usize);
    }
    hash
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SignalError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn provider_name(&self) -> &str {
        "local"
    }
}

/// Ollama embedder (uses the local Ollama `/api/embed` endpoint).
pub struct OllamaEmbedder {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OllamaEmbedder {
    pub fn new(model: Option<String>, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.unwrap_or_else(|| "all-minilm".into()),
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".into()),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SignalError> {
        let url = format!("{}/api/embed", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let json = post_json(&self.client, &url, None, &body).await?;
        let rows = json["embeddings"]
            .as_array()
            .ok_or_else(|| SignalError::embedding("response has no 'embeddings' array"))?;
        rows.iter().map(parse_vector).collect()
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

/// OpenAI API embedder (uses text-embedding-3-small by default).
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| "text-embedding-3-small".into()),
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".into()),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SignalError> {
        let url = format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let json = post_json(&self.client, &url, Some(&self.api_key), &body).await?;
        let data = json["data"]
            .as_array()
            .ok_or_else(|| SignalError::embedding("response has no 'data' array"))?;
        data.iter()
            .map(|item| parse_vector(&item["embedding"]))
            .collect()
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

async fn post_json(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
    body: &serde_json::Value,
) -> Result<serde_json::Value, SignalError> {
    let mut request = client.post(url).json(body);
    if let Some(key) = bearer {
        request = request.bearer_auth(key);
    }

    let resp = request
        .send()
        .await
        .map_err(|e| SignalError::embedding(format!("request to {url} failed: {e}")))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(SignalError::embedding(format!(
            "{url} returned HTTP {status}"
        )));
    }
    resp.json::<serde_json::Value>()
        .await
        .map_err(|e| SignalError::embedding(format!("invalid JSON from {url}: {e}")))
}

fn parse_vector(value: &serde_json::Value) -> Result<Vec<f32>, SignalError> {
    let items = value
        .as_array()
        .ok_or_else(|| SignalError::embedding("embedding is not an array"))?;
    items
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| SignalError::embedding("embedding contains a non-numeric value"))
        })
        .collect()
}

/// Factory function to create an embedder based on configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>, ConfigError> {
    match config.provider.as_str() {
        "local" => Ok(Box::new(LocalEmbedder::new(config.dimensions))),
        "ollama" => Ok(Box::new(OllamaEmbedder::new(
            config.model.clone(),
            config.base_url.clone(),
        ))),
        "openai" => {
            let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
            if api_key.is_empty() {
                return Err(ConfigError::MissingField {
                    field: config.api_key_env.clone(),
                });
            }
            Ok(Box::new(OpenAiEmbedder::new(
                api_key,
                config.model.clone(),
                config.base_url.clone(),
            )))
        }
        other => Err(ConfigError::InvalidValue {
            field: "embedding.provider".into(),
            message: format!("unknown provider '{other}' (expected local, ollama or openai)"),
        }),
    }
}
