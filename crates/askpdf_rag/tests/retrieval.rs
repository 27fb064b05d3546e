use askpdf_core::error::AppError;
use askpdf_core::store::ChunkStore;
use askpdf_rag::embed::Embedder;
use askpdf_rag::retrieve::{retrieve, RetrievalParams};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

// Deterministic embedding: counts of 'a', 'b', and 'c'.
struct CountAbcEmbedder;

impl Embedder for CountAbcEmbedder {
    fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        Ok(inputs
            .iter()
            .map(|s| {
                let mut counts = [0f32; 3];
                for ch in s.chars() {
                    match ch {
                        'a' => counts[0] += 1.0,
                        'b' => counts[1] += 1.0,
                        'c' => counts[2] += 1.0,
                        _ => {}
                    }
                }
                counts.to_vec()
            })
            .collect())
    }
}

fn seeded_store(dir: &TempDir, texts: &[&str]) -> ChunkStore {
    let store = ChunkStore::open(dir.path().join("chunks.sqlite"));
    let texts: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
    let embeddings = CountAbcEmbedder.embed_batch(&texts).expect("embed");
    store
        .upsert_batch("pdfs", &texts, &embeddings)
        .expect("upsert");
    store
}

fn params(top_k: usize, fetch_k: usize, lambda: f32) -> RetrievalParams {
    RetrievalParams {
        top_k,
        fetch_k,
        lambda,
    }
}

#[test]
fn retrieval_is_deterministic_for_a_fixed_collection() {
    let dir = TempDir::new().expect("tempdir");
    let store = seeded_store(&dir, &["aaaa", "aab", "bbbb", "bbc", "cccc"]);

    let first = retrieve(&store, "pdfs", &CountAbcEmbedder, "aa bb", params(3, 10, 0.5))
        .expect("retrieve");
    let second = retrieve(&store, "pdfs", &CountAbcEmbedder, "aa bb", params(3, 10, 0.5))
        .expect("retrieve");

    let first_ids: Vec<&str> = first.iter().map(|c| c.id.as_str()).collect();
    let second_ids: Vec<&str> = second.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(first_ids, second_ids);
    assert_eq!(first.len(), 3);
}

#[test]
fn similarity_ranks_the_matching_chunk_first() {
    let dir = TempDir::new().expect("tempdir");
    let store = seeded_store(&dir, &["aaaa", "bbbb"]);

    let hits = retrieve(&store, "pdfs", &CountAbcEmbedder, "aaa", params(2, 10, 1.0))
        .expect("retrieve");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, "aaaa");
    assert_eq!(hits[1].text, "bbbb");
}

#[test]
fn diversity_displaces_a_near_duplicate() {
    let dir = TempDir::new().expect("tempdir");
    // doc_0 and doc_1 are near-duplicates; doc_2 is less similar to the
    // query but diverse. Pure similarity would keep both duplicates;
    // balanced MMR keeps the best one and the diverse chunk.
    let store = seeded_store(&dir, &["aaaa aaaa", "aaaa aaab", "ab bb bb"]);

    let hits = retrieve(&store, "pdfs", &CountAbcEmbedder, "aaa b", params(2, 10, 0.5))
        .expect("retrieve");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "doc_1");
    assert_eq!(hits[1].text, "ab bb bb");

    // Pure similarity keeps the duplicate instead.
    let hits = retrieve(&store, "pdfs", &CountAbcEmbedder, "aaa b", params(2, 10, 1.0))
        .expect("retrieve");
    assert_eq!(hits[0].id, "doc_1");
    assert_eq!(hits[1].id, "doc_0");
}

#[test]
fn small_collections_degrade_to_fewer_results() {
    let dir = TempDir::new().expect("tempdir");
    let store = seeded_store(&dir, &["aaaa"]);

    let hits = retrieve(&store, "pdfs", &CountAbcEmbedder, "aaa", params(3, 10, 0.5))
        .expect("retrieve");
    assert_eq!(hits.len(), 1);
}

#[test]
fn empty_collection_yields_empty_context_not_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let store = ChunkStore::open(dir.path().join("chunks.sqlite"));
    store.create_collection("pdfs").expect("create");

    let hits = retrieve(&store, "pdfs", &CountAbcEmbedder, "aaa", params(3, 10, 0.5))
        .expect("retrieve");
    assert!(hits.is_empty());
}

#[test]
fn fetch_k_bounds_the_candidate_pool() {
    let dir = TempDir::new().expect("tempdir");
    let store = seeded_store(&dir, &["aaaa", "aaab", "aabb", "abbb", "bbbb"]);

    // With fetch_k = 2 only the two nearest candidates are eligible, so
    // the diverse 'bbbb' chunk cannot appear even at low lambda.
    let hits = retrieve(&store, "pdfs", &CountAbcEmbedder, "aaaa", params(2, 2, 0.0))
        .expect("retrieve");
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|c| c.text != "bbbb"));
}

#[test]
fn zero_norm_question_embedding_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let store = seeded_store(&dir, &["aaaa"]);

    let err = retrieve(&store, "pdfs", &CountAbcEmbedder, "zzzz", params(3, 10, 0.5))
        .expect_err("should reject");
    assert_eq!(err.code, "RETRIEVAL_FAILED");
}
