use askpdf_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::ollama::OllamaClient;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

fn truncate_chars(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl Embedder for OllamaEmbedder {
    fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        // Chunking keeps inputs bounded, but guard against oversized text anyway.
        let input: Vec<&str> = inputs.iter().map(|s| truncate_chars(s, 12_000)).collect();

        let url = format!("{}/api/embed", self.client.base_url());
        let req = EmbedRequest {
            model: &self.model,
            input,
        };
        let resp = ureq::post(&url)
            .timeout(std::time::Duration::from_secs(10))
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new("EMBEDDINGS_UNAVAILABLE", "Failed to encode embeddings request")
                    .with_details(e.to_string())
            })?);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: EmbedResponse = r.into_json().map_err(|e| {
                    AppError::new(
                        "EMBEDDINGS_UNAVAILABLE",
                        "Failed to decode embeddings response",
                    )
                    .with_details(e.to_string())
                })?;
                if v.embeddings.len() != inputs.len() {
                    return Err(AppError::new(
                        "EMBEDDINGS_UNAVAILABLE",
                        "Embeddings response count does not match input count",
                    )
                    .with_details(format!(
                        "inputs={}; embeddings={}",
                        inputs.len(),
                        v.embeddings.len()
                    )));
                }
                if v.embeddings.iter().any(|e| e.is_empty()) {
                    return Err(AppError::new(
                        "EMBEDDINGS_UNAVAILABLE",
                        "Embeddings response contained an empty vector",
                    ));
                }
                Ok(v.embeddings)
            }
            Ok(r) => Err(
                AppError::new("EMBEDDINGS_UNAVAILABLE", "Embeddings request failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(
                AppError::new("EMBEDDINGS_UNAVAILABLE", "Failed to call embeddings endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}
