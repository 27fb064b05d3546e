use askpdf_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Llm;
use crate::ollama::OllamaClient;

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
    model: String,
    retries: u32,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient, model: impl Into<String>, retries: u32) -> Self {
        Self {
            client,
            model: model.into(),
            retries,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

fn is_timeout(e: &ureq::Error) -> bool {
    matches!(e, ureq::Error::Transport(_))
        && e.to_string().to_ascii_lowercase().contains("timed out")
}

impl Llm for OllamaLlm {
    fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, AppError> {
        let url = format!("{}/api/generate", self.client.base_url());

        let mut attempt = 0u32;
        loop {
            let req = GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
                options: GenerateOptions {
                    num_predict: max_tokens,
                    temperature,
                },
            };
            let resp = ureq::post(&url)
                .timeout(std::time::Duration::from_secs(30))
                .send_json(serde_json::to_value(req).map_err(|e| {
                    AppError::new("LLM_UNAVAILABLE", "Failed to encode completion request")
                        .with_details(e.to_string())
                })?);

            match resp {
                Ok(r) if r.status() == 200 => {
                    let v: GenerateResponse = r.into_json().map_err(|e| {
                        AppError::new("LLM_UNAVAILABLE", "Failed to decode completion response")
                            .with_details(e.to_string())
                    })?;
                    if v.response.trim().is_empty() {
                        return Err(AppError::new(
                            "LLM_UNAVAILABLE",
                            "Completion response was empty",
                        ));
                    }
                    return Ok(v.response);
                }
                Ok(r) => {
                    return Err(
                        AppError::new("LLM_UNAVAILABLE", "Completion request failed")
                            .with_details(format!("status={}", r.status())),
                    );
                }
                Err(e) if is_timeout(&e) => {
                    return Err(AppError::new(
                        "LLM_TIMEOUT",
                        "Completion request exceeded its deadline",
                    )
                    .with_details(e.to_string())
                    .with_retryable(true));
                }
                Err(e) => {
                    if attempt < self.retries {
                        attempt += 1;
                        tracing::debug!(attempt, err = %e, "retrying completion after transport error");
                        continue;
                    }
                    return Err(AppError::new(
                        "LLM_UNAVAILABLE",
                        "Failed to call completion endpoint",
                    )
                    .with_details(format!("attempts={}; err={}", attempt + 1, e))
                    .with_retryable(true));
                }
            }
        }
    }
}
