use askpdf_core::store::ChunkStore;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn temp_store() -> (TempDir, ChunkStore) {
    let dir = TempDir::new().expect("tempdir");
    let store = ChunkStore::open(dir.path().join("chunks.sqlite"));
    (dir, store)
}

#[test]
fn upsert_assigns_sequential_ids_from_zero() {
    let (_dir, store) = temp_store();
    let ids = store
        .upsert_batch(
            "pdfs",
            &["one".to_string(), "two".to_string()],
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .expect("upsert");
    assert_eq!(ids, vec!["doc_0".to_string(), "doc_1".to_string()]);
    assert_eq!(store.count("pdfs").expect("count"), 2);
}

#[test]
fn repeated_ingest_continues_the_id_range() {
    let (_dir, store) = temp_store();
    store
        .upsert_batch("pdfs", &["one".to_string()], &[vec![1.0, 0.0]])
        .expect("first");
    let ids = store
        .upsert_batch("pdfs", &["two".to_string()], &[vec![0.0, 1.0]])
        .expect("second");
    assert_eq!(ids, vec!["doc_1".to_string()]);

    let chunks = store.list("pdfs").expect("list");
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].id, "doc_0");
    assert_eq!(chunks[0].text, "one");
    assert_eq!(chunks[1].id, "doc_1");
    assert_eq!(chunks[1].text, "two");
}

#[test]
fn query_ranks_by_cosine_with_id_tie_break() {
    let (_dir, store) = temp_store();
    store
        .upsert_batch(
            "pdfs",
            &[
                "mostly x".to_string(),
                "mostly y".to_string(),
                "x again".to_string(),
            ],
            &[vec![1.0, 0.0], vec![0.0, 1.0], vec![2.0, 0.0]],
        )
        .expect("upsert");

    let hits = store.query("pdfs", &[1.0, 0.0], 10).expect("query");
    assert_eq!(hits.len(), 3);
    // doc_0 and doc_2 both score 1.0; ascending id breaks the tie.
    assert_eq!(hits[0].id, "doc_0");
    assert_eq!(hits[1].id, "doc_2");
    assert_eq!(hits[2].id, "doc_1");

    let truncated = store.query("pdfs", &[1.0, 0.0], 2).expect("query");
    assert_eq!(truncated.len(), 2);
}

#[test]
fn query_on_absent_collection_is_empty() {
    let (_dir, store) = temp_store();
    let hits = store.query("nothing", &[1.0, 0.0], 5).expect("query");
    assert!(hits.is_empty());
}

#[test]
fn query_skips_zero_norm_vectors() {
    let (_dir, store) = temp_store();
    store
        .upsert_batch(
            "pdfs",
            &["blank".to_string(), "real".to_string()],
            &[vec![0.0, 0.0], vec![1.0, 0.0]],
        )
        .expect("upsert");
    let hits = store.query("pdfs", &[1.0, 0.0], 10).expect("query");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "doc_1");
}

#[test]
fn query_rejects_dimension_mismatch() {
    let (_dir, store) = temp_store();
    store
        .upsert_batch("pdfs", &["one".to_string()], &[vec![1.0, 0.0]])
        .expect("upsert");
    let err = store
        .query("pdfs", &[1.0, 0.0, 0.0], 10)
        .expect_err("should reject");
    assert_eq!(err.code, "STORE_FAILED");
}

#[test]
fn mismatched_batch_lengths_commit_nothing() {
    let (_dir, store) = temp_store();
    let err = store
        .upsert_batch(
            "pdfs",
            &["one".to_string(), "two".to_string()],
            &[vec![1.0, 0.0]],
        )
        .expect_err("should reject");
    assert_eq!(err.code, "STORE_FAILED");
    assert_eq!(store.count("pdfs").expect("count"), 0);
}

#[test]
fn reset_empties_the_collection_and_restarts_ids() {
    let (_dir, store) = temp_store();
    store
        .upsert_batch("pdfs", &["one".to_string()], &[vec![1.0, 0.0]])
        .expect("upsert");
    store.reset_collection("pdfs").expect("reset");
    assert_eq!(store.count("pdfs").expect("count"), 0);
    assert!(store.query("pdfs", &[1.0, 0.0], 10).expect("query").is_empty());

    let ids = store
        .upsert_batch("pdfs", &["fresh".to_string()], &[vec![1.0, 0.0]])
        .expect("upsert");
    assert_eq!(ids, vec!["doc_0".to_string()]);
}

#[test]
fn reset_is_idempotent_on_an_empty_collection() {
    let (_dir, store) = temp_store();
    store.reset_collection("pdfs").expect("first");
    store.reset_collection("pdfs").expect("second");
    assert_eq!(store.count("pdfs").expect("count"), 0);
}

#[test]
fn chunks_carry_content_fingerprints() {
    let (_dir, store) = temp_store();
    store
        .upsert_batch("pdfs", &["The sky is blue.".to_string()], &[vec![1.0]])
        .expect("upsert");
    let chunks = store.list("pdfs").expect("list");
    assert_eq!(chunks[0].text_sha256.len(), 64);
    assert!(chunks[0].text_sha256.chars().all(|c| c.is_ascii_hexdigit()));
}
