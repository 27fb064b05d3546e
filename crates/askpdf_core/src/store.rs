use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db;
use crate::error::AppError;
use crate::similarity::{cosine_similarity, l2_norm};

/// A persisted chunk: the (id, text, embedding) triple plus the monotone
/// sequence number backing id assignment and a content fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredChunk {
    pub id: String,
    pub seq: i64,
    pub text: String,
    pub embedding: Vec<f32>,
    pub text_sha256: String,
}

/// A retrieval candidate scored against one query vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub score: f32,
}

/// SQLite-backed vector collection store. Holds only the database path; a
/// connection is opened (and migrated) per operation, so clones of the
/// handle are cheap and safe to share across request flows.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    db_path: PathBuf,
}

impl ChunkStore {
    pub fn open(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }

    fn conn(&self) -> Result<Connection, AppError> {
        let mut conn = db::open(&self.db_path)?;
        db::migrate(&mut conn)?;
        Ok(conn)
    }

    pub fn create_collection(&self, name: &str) -> Result<(), AppError> {
        let conn = self.conn()?;
        ensure_collection_row(&conn, name)
    }

    pub fn delete_collection(&self, name: &str) -> Result<(), AppError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(|e| {
            AppError::new("STORE_TX_FAILED", "Failed to start delete transaction")
                .with_details(e.to_string())
        })?;
        tx.execute("DELETE FROM chunks WHERE collection = ?1", [name])
            .map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to delete collection chunks")
                    .with_details(format!("collection={name}; err={e}"))
            })?;
        tx.execute("DELETE FROM collections WHERE name = ?1", [name])
            .map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to delete collection record")
                    .with_details(format!("collection={name}; err={e}"))
            })?;
        tx.commit().map_err(|e| {
            AppError::new("STORE_TX_FAILED", "Failed to commit delete transaction")
                .with_details(e.to_string())
        })
    }

    /// Delete and recreate a collection in one transaction. Subsequent
    /// reads observe either the old contents or a fresh empty collection,
    /// never a partially-deleted one. Idempotent on an empty or absent
    /// collection.
    pub fn reset_collection(&self, name: &str) -> Result<(), AppError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(|e| {
            AppError::new("STORE_TX_FAILED", "Failed to start reset transaction")
                .with_details(e.to_string())
        })?;
        tx.execute("DELETE FROM chunks WHERE collection = ?1", [name])
            .map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to clear collection chunks")
                    .with_details(format!("collection={name}; err={e}"))
            })?;
        tx.execute("DELETE FROM collections WHERE name = ?1", [name])
            .map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to clear collection record")
                    .with_details(format!("collection={name}; err={e}"))
            })?;
        tx.execute(
            "INSERT INTO collections(name, created_at) VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ','now'))",
            [name],
        )
        .map_err(|e| {
            AppError::new("STORE_FAILED", "Failed to recreate collection record")
                .with_details(format!("collection={name}; err={e}"))
        })?;
        tx.commit().map_err(|e| {
            AppError::new("STORE_TX_FAILED", "Failed to commit reset transaction")
                .with_details(e.to_string())
        })
    }

    /// Append a batch of (text, embedding) pairs as one transaction: all
    /// rows or none. Ids are assigned inside the transaction as
    /// `doc_{seq}`, with `seq` continuing from the highest value already
    /// persisted for the collection, so repeated ingests never overwrite
    /// earlier chunks. Returns the assigned ids in input order.
    pub fn upsert_batch(
        &self,
        collection: &str,
        texts: &[String],
        embeddings: &[Vec<f32>],
    ) -> Result<Vec<String>, AppError> {
        if texts.len() != embeddings.len() {
            return Err(AppError::new(
                "STORE_FAILED",
                "Chunk texts and embeddings must pair up one-to-one",
            )
            .with_details(format!(
                "texts={}; embeddings={}",
                texts.len(),
                embeddings.len()
            )));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(|e| {
            AppError::new("STORE_TX_FAILED", "Failed to start upsert transaction")
                .with_details(e.to_string())
        })?;

        ensure_collection_row(&tx, collection)?;

        let base: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(seq) + 1, 0) FROM chunks WHERE collection = ?1",
                [collection],
                |row| row.get(0),
            )
            .map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to read collection sequence")
                    .with_details(format!("collection={collection}; err={e}"))
            })?;

        let mut ids = Vec::with_capacity(texts.len());
        for (i, (text, embedding)) in texts.iter().zip(embeddings.iter()).enumerate() {
            let seq = base + i as i64;
            let id = format!("doc_{seq}");
            let encoded = serde_json::to_string(embedding).map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to encode chunk embedding")
                    .with_details(e.to_string())
            })?;
            tx.execute(
                "INSERT INTO chunks(collection, chunk_id, seq, text, text_sha256, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![collection, id, seq, text, sha256_hex(text.as_bytes()), encoded],
            )
            .map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to insert chunk")
                    .with_details(format!("collection={collection}; chunk_id={id}; err={e}"))
            })?;
            ids.push(id);
        }

        tx.commit().map_err(|e| {
            AppError::new("STORE_TX_FAILED", "Failed to commit upsert transaction")
                .with_details(e.to_string())
        })?;
        Ok(ids)
    }

    /// Rank every chunk in the collection against `query_vec` by cosine
    /// similarity and return the top `fetch_k`, descending by score with
    /// ascending chunk id as the deterministic tie-break. An absent or
    /// empty collection yields an empty result. Zero-norm stored vectors
    /// are skipped; a dimensionality mismatch is a storage fault.
    pub fn query(
        &self,
        collection: &str,
        query_vec: &[f32],
        fetch_k: usize,
    ) -> Result<Vec<ScoredChunk>, AppError> {
        let query_norm = l2_norm(query_vec);
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT chunk_id, text, embedding FROM chunks WHERE collection = ?1")
            .map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to prepare collection scan")
                    .with_details(e.to_string())
            })?;
        let rows = stmt
            .query_map([collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to scan collection")
                    .with_details(format!("collection={collection}; err={e}"))
            })?;

        let mut scored: Vec<ScoredChunk> = Vec::new();
        for row in rows {
            let (id, text, encoded) = row.map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to read chunk row")
                    .with_details(format!("collection={collection}; err={e}"))
            })?;
            let embedding: Vec<f32> = serde_json::from_str(&encoded).map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to decode chunk embedding")
                    .with_details(format!("collection={collection}; chunk_id={id}; err={e}"))
            })?;
            if embedding.len() != query_vec.len() {
                return Err(AppError::new(
                    "STORE_FAILED",
                    "Stored embedding dimensions do not match query",
                )
                .with_details(format!(
                    "collection={collection}; chunk_id={id}; expected={}; got={}",
                    query_vec.len(),
                    embedding.len()
                )));
            }
            let norm = l2_norm(&embedding);
            if norm == 0.0 {
                continue;
            }
            let score = cosine_similarity(query_vec, &embedding, query_norm, norm);
            scored.push(ScoredChunk {
                id,
                text,
                embedding,
                score,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(fetch_k);
        Ok(scored)
    }

    pub fn count(&self, collection: &str) -> Result<i64, AppError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            [collection],
            |row| row.get(0),
        )
        .map_err(|e| {
            AppError::new("STORE_FAILED", "Failed to count collection chunks")
                .with_details(format!("collection={collection}; err={e}"))
        })
    }

    /// All chunks of a collection in insertion order. Diagnostic surface;
    /// retrieval goes through `query`.
    pub fn list(&self, collection: &str) -> Result<Vec<StoredChunk>, AppError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT chunk_id, seq, text, text_sha256, embedding
                 FROM chunks WHERE collection = ?1 ORDER BY seq ASC",
            )
            .map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to prepare collection listing")
                    .with_details(e.to_string())
            })?;
        let rows = stmt
            .query_map([collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to list collection")
                    .with_details(format!("collection={collection}; err={e}"))
            })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, seq, text, text_sha256, encoded) = row.map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to read chunk row")
                    .with_details(format!("collection={collection}; err={e}"))
            })?;
            let embedding: Vec<f32> = serde_json::from_str(&encoded).map_err(|e| {
                AppError::new("STORE_FAILED", "Failed to decode chunk embedding")
                    .with_details(format!("collection={collection}; chunk_id={id}; err={e}"))
            })?;
            out.push(StoredChunk {
                id,
                seq,
                text,
                embedding,
                text_sha256,
            });
        }
        Ok(out)
    }
}

fn ensure_collection_row(conn: &Connection, name: &str) -> Result<(), AppError> {
    conn.execute(
        "INSERT OR IGNORE INTO collections(name, created_at)
         VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ','now'))",
        [name],
    )
    .map_err(|e| {
        AppError::new("STORE_FAILED", "Failed to ensure collection exists")
            .with_details(format!("collection={name}; err={e}"))
    })?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}
