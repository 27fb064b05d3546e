use std::sync::RwLock;

use askpdf_core::config::RagConfig;
use askpdf_core::error::AppError;
use askpdf_core::store::ChunkStore;
use serde::Serialize;

use crate::answer::{AnswerContract, RagAnswer};
use crate::chunk::TextSplitter;
use crate::context;
use crate::embed::Embedder;
use crate::llm::Llm;
use crate::retrieve::{retrieve, RetrievalParams};

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetSummary {
    pub ok: bool,
}

/// The collection binding replaced wholesale by `reset()`. Guarded by the
/// pipeline gate: shared for ingest/answer, exclusive for reset.
#[derive(Debug)]
struct Binding {
    store: ChunkStore,
    collection: String,
}

/// Wires chunking, embedding, storage, retrieval, and synthesis into the
/// ingest/answer/reset flows. Every flow fails fast: the first component
/// error aborts it and propagates unchanged.
///
/// Concurrency: `ingest` and `answer` hold the gate shared for their whole
/// flow, provider I/O included, so they interleave freely with each other;
/// `reset` holds it exclusively, which serializes it against every
/// in-flight flow. A completed reset therefore leaves no chunk behind: a
/// racing ingest either committed earlier (and was deleted) or starts
/// against the fresh collection. The exclusive section touches only local
/// storage, never provider I/O.
pub struct RagPipeline {
    config: RagConfig,
    splitter: TextSplitter,
    contract: AnswerContract,
    embedder: Box<dyn Embedder>,
    llm: Box<dyn Llm>,
    binding: RwLock<Binding>,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("config", &self.config)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl RagPipeline {
    /// Validates configuration up front; chunking and retrieval parameter
    /// errors are fatal here, before any request is served.
    pub fn new(
        config: RagConfig,
        embedder: Box<dyn Embedder>,
        llm: Box<dyn Llm>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;
        let store = ChunkStore::open(config.db_path.clone());
        store.create_collection(&config.collection)?;
        let binding = RwLock::new(Binding {
            store,
            collection: config.collection.clone(),
        });
        Ok(Self {
            config,
            splitter,
            contract: AnswerContract,
            embedder,
            llm,
            binding,
        })
    }

    fn read_binding(&self) -> Result<std::sync::RwLockReadGuard<'_, Binding>, AppError> {
        self.binding
            .read()
            .map_err(|_| AppError::new("PIPELINE_GATE_FAILED", "Pipeline gate is poisoned"))
    }

    /// Ingest extracted page texts: split every page, embed all chunk
    /// texts in one batch, then append the whole batch to the collection
    /// in one transaction. Nothing is written unless every embedding
    /// succeeded. Returns the number of chunks stored.
    pub fn ingest(&self, pages: &[String]) -> Result<IngestSummary, AppError> {
        let mut texts: Vec<String> = Vec::new();
        for page in pages {
            if page.trim().is_empty() {
                continue;
            }
            texts.extend(self.splitter.split(page));
        }
        if texts.is_empty() {
            return Err(AppError::new(
                "INGEST_INPUT_EMPTY",
                "Ingestion payload contained no text",
            ));
        }

        let binding = self.read_binding()?;
        let embeddings = self.embedder.embed_batch(&texts)?;
        let ids = binding
            .store
            .upsert_batch(&binding.collection, &texts, &embeddings)?;
        tracing::info!(
            collection = %binding.collection,
            count = ids.len(),
            "ingested chunk batch"
        );
        Ok(IngestSummary {
            count: ids.len() as u32,
        })
    }

    /// Answer a question: retrieve diverse context, assemble it, render
    /// the prompt, complete, and validate the structured reply. When
    /// `repair_attempts` is configured, a malformed reply is fed back to
    /// the model with its validation error up to that many times before
    /// the error surfaces.
    pub fn answer(&self, question: &str) -> Result<RagAnswer, AppError> {
        let binding = self.read_binding()?;

        let hits = retrieve(
            &binding.store,
            &binding.collection,
            self.embedder.as_ref(),
            question,
            RetrievalParams {
                top_k: self.config.top_k,
                fetch_k: self.config.fetch_k,
                lambda: self.config.mmr_lambda,
            },
        )?;
        let assembled = context::assemble(&hits);
        tracing::debug!(
            chunks = hits.len(),
            context_chars = assembled.len(),
            "assembled retrieval context"
        );

        let prompt = self.contract.build_prompt(&assembled, question);
        let mut raw = self
            .llm
            .complete(&prompt, self.config.max_tokens, self.config.temperature)?;

        let mut last_err = match self.contract.parse(&raw) {
            Ok(answer) => return Ok(answer),
            Err(e) => e,
        };
        for attempt in 0..self.config.repair_attempts {
            tracing::debug!(attempt, "re-prompting after malformed model output");
            let prompt = self
                .contract
                .repair_prompt(&assembled, question, &raw, &last_err.message);
            raw = self
                .llm
                .complete(&prompt, self.config.max_tokens, self.config.temperature)?;
            match self.contract.parse(&raw) {
                Ok(answer) => return Ok(answer),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    /// Delete and recreate the collection, then let subsequent flows
    /// observe the fresh binding. Exclusive access makes this atomic with
    /// respect to in-flight ingest/answer calls. Idempotent on an empty
    /// collection.
    pub fn reset(&self) -> Result<ResetSummary, AppError> {
        let binding = self
            .binding
            .write()
            .map_err(|_| AppError::new("PIPELINE_GATE_FAILED", "Pipeline gate is poisoned"))?;
        binding.store.reset_collection(&binding.collection)?;
        tracing::info!(collection = %binding.collection, "collection reset");
        Ok(ResetSummary { ok: true })
    }
}
