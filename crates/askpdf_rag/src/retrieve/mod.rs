use askpdf_core::error::AppError;
use askpdf_core::similarity::l2_norm;
use askpdf_core::store::{ChunkStore, ScoredChunk};

use crate::embed::Embedder;

mod mmr;

/// Retrieval tuning: `top_k` chunks survive the diversity re-ranking of
/// `fetch_k` similarity candidates, balanced by `lambda` (1.0 pure
/// similarity, 0.0 pure diversity).
#[derive(Debug, Clone, Copy)]
pub struct RetrievalParams {
    pub top_k: usize,
    pub fetch_k: usize,
    pub lambda: f32,
}

/// Embed the question, fetch the `fetch_k` nearest chunks by cosine
/// similarity, then select `top_k` by maximal marginal relevance. Returns
/// fewer than `top_k` chunks only when the collection holds fewer; an
/// empty collection yields an empty result, never an error.
pub fn retrieve(
    store: &ChunkStore,
    collection: &str,
    embedder: &dyn Embedder,
    question: &str,
    params: RetrievalParams,
) -> Result<Vec<ScoredChunk>, AppError> {
    let query_vec = embedder.embed_one(question)?;
    if l2_norm(&query_vec) == 0.0 {
        return Err(AppError::new(
            "RETRIEVAL_FAILED",
            "Question embedding norm is zero",
        ));
    }

    let candidates = store.query(collection, &query_vec, params.fetch_k)?;
    tracing::debug!(
        candidates = candidates.len(),
        top_k = params.top_k,
        "re-ranking retrieval candidates"
    );
    Ok(mmr::mmr_select(candidates, params.top_k, params.lambda))
}
