use askpdf_core::error::AppError;

/// Converts text into fixed-dimension vectors. One deployment uses one
/// embedding space; mixing models across a collection is a caller error
/// surfaced by the store's dimension check.
pub trait Embedder: Send + Sync {
    fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError>;

    fn embed_one(&self, input: &str) -> Result<Vec<f32>, AppError> {
        let mut vectors = self.embed_batch(&[input.to_string()])?;
        vectors.pop().ok_or_else(|| {
            AppError::new(
                "EMBEDDINGS_UNAVAILABLE",
                "Embedding provider returned no vector",
            )
        })
    }
}

pub mod ollama_embed;
