use askpdf_core::store::ScoredChunk;

/// Join retrieved chunk texts with a blank line, preserving retrieval
/// order. An empty sequence assembles to the empty string, which is the
/// downstream signal that the model must answer from reasoning alone.
pub fn assemble(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
