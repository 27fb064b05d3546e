use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Pipeline configuration: chunking, retrieval, provider, and synthesis
/// knobs. Loaded from an optional TOML file merged with `ASKPDF_*`
/// environment variables; every field has a default so an empty config is
/// valid. Invalid combinations are rejected at startup, before any request
/// is served.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// SQLite database file backing the vector collection.
    pub db_path: String,
    /// Collection name; all ingest/answer/reset calls target this.
    pub collection: String,

    pub chunk_size: usize,
    pub chunk_overlap: usize,

    /// Chunks returned to the prompt after diversity re-ranking.
    pub top_k: usize,
    /// Similarity candidates fetched before re-ranking.
    pub fetch_k: usize,
    /// MMR balance: 1.0 pure similarity, 0.0 pure diversity.
    pub mmr_lambda: f32,

    pub base_url: String,
    pub embed_model: String,
    pub llm_model: String,

    pub max_tokens: u32,
    pub temperature: f32,
    /// Retries against transient LLM transport failures.
    pub llm_retries: u32,
    /// Bounded re-prompts after a malformed model reply. 0 disables the
    /// repair loop and surfaces the validation error immediately.
    pub repair_attempts: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            db_path: "askpdf.sqlite".to_string(),
            collection: "pdfs".to_string(),
            chunk_size: 500,
            chunk_overlap: 100,
            top_k: 3,
            fetch_k: 10,
            mmr_lambda: 0.5,
            base_url: "http://127.0.0.1:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            llm_model: "llama3.1".to_string(),
            max_tokens: 500,
            temperature: 0.3,
            llm_retries: 2,
            repair_attempts: 0,
        }
    }
}

impl RagConfig {
    /// Merge `askpdf.toml` (or an explicit file) with `ASKPDF_*` env vars
    /// and validate the result. A missing file is fine; a malformed one is
    /// `CONFIG_INVALID`.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let file = path.unwrap_or_else(|| Path::new("askpdf.toml"));
        let config: RagConfig = Figment::new()
            .merge(Toml::file(file))
            .merge(Env::prefixed("ASKPDF_"))
            .extract()
            .map_err(|e| {
                AppError::new("CONFIG_INVALID", "Failed to load configuration")
                    .with_details(e.to_string())
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 {
            return Err(AppError::new("CONFIG_INVALID", "chunk_size must be positive"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "chunk_overlap must be smaller than chunk_size",
            )
            .with_details(format!(
                "chunk_size={}; chunk_overlap={}",
                self.chunk_size, self.chunk_overlap
            )));
        }
        if self.top_k == 0 || self.top_k > self.fetch_k {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "top_k must satisfy 1 <= top_k <= fetch_k",
            )
            .with_details(format!("top_k={}; fetch_k={}", self.top_k, self.fetch_k)));
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "mmr_lambda must be within [0.0, 1.0]",
            )
            .with_details(format!("mmr_lambda={}", self.mmr_lambda)));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "temperature must be within [0.0, 2.0]",
            )
            .with_details(format!("temperature={}", self.temperature)));
        }
        if self.max_tokens == 0 {
            return Err(AppError::new("CONFIG_INVALID", "max_tokens must be positive"));
        }
        if self.collection.trim().is_empty() {
            return Err(AppError::new("CONFIG_INVALID", "collection name must not be empty"));
        }
        Ok(())
    }
}
