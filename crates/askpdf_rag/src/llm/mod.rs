use askpdf_core::error::AppError;

/// Language-model completion capability. Implementations own their retry
/// budget for transient transport failures; callers see only the final
/// outcome.
pub trait Llm: Send + Sync {
    fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32)
        -> Result<String, AppError>;
}

pub mod ollama_llm;
