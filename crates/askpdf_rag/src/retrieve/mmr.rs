use askpdf_core::similarity::{cosine_similarity, l2_norm};
use askpdf_core::store::ScoredChunk;

/// Maximal-marginal-relevance selection over similarity-ranked candidates:
/// iteratively pick the candidate maximizing
/// `lambda * sim(query, c) - (1 - lambda) * max(sim(c, selected))`.
/// Candidate query similarity is the score the store already computed.
/// Ties break on ascending chunk id so a fixed collection state always
/// yields the same ordering.
pub(crate) fn mmr_select(
    candidates: Vec<ScoredChunk>,
    k: usize,
    lambda: f32,
) -> Vec<ScoredChunk> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let norms: Vec<f32> = candidates.iter().map(|c| l2_norm(&c.embedding)).collect();
    let mut selected: Vec<usize> = Vec::new();
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_pos = 0usize;
        let mut best_score = f32::NEG_INFINITY;

        for (pos, &ci) in remaining.iter().enumerate() {
            let max_selected_sim = selected
                .iter()
                .map(|&si| {
                    cosine_similarity(
                        &candidates[ci].embedding,
                        &candidates[si].embedding,
                        norms[ci],
                        norms[si],
                    )
                })
                .fold(0.0f32, f32::max);
            let score = lambda * candidates[ci].score - (1.0 - lambda) * max_selected_sim;

            let better = score > best_score
                || (score == best_score && candidates[ci].id < candidates[remaining[best_pos]].id);
            if better {
                best_score = score;
                best_pos = pos;
            }
        }

        selected.push(remaining.remove(best_pos));
    }

    selected
        .into_iter()
        .map(|i| candidates[i].clone())
        .collect()
}
