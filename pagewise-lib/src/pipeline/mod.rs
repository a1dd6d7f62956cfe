//! Ingestion and question answering end to end
//!
//! ```text
//! ingest: text -> Segmenter -> chunks -> Embedder -> VectorStore
//! ask:    question -> Retriever -> chunks -> Synthesizer -> Answer
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use pagewise_lib::pipeline::Pipeline;
//!
//! let mut pipeline = Pipeline::new(retriever, synthesizer, &config)?;
//! pipeline.ingest(&text, &Document::new("handbook", "handbook.pdf"))?;
//! let answer = pipeline.ask("How many vacation days do I get?", Some(5), None).await?;
//! pipeline.close()?;
//! ```

use tracing::info;

use crate::answer::{Answer, LanguageModel, Synthesizer};
use crate::chunk::{Chunk, Document, Segmenter};
use crate::config::{ChunkConfig, Config, RetrievalConfig};
use crate::embed::Embedder;
use crate::retrieve::Retriever;
use crate::store::{DocFilter, VectorStore};
use crate::Result;

/// Owns every collaborator of the question-answering flow.
pub struct Pipeline<E: Embedder, S: VectorStore, M: LanguageModel> {
    segmenter: Segmenter,
    retriever: Retriever<E, S>,
    synthesizer: Synthesizer<M>,
    retrieval: RetrievalConfig,
}

impl<E: Embedder, S: VectorStore, M: LanguageModel> Pipeline<E, S, M> {
    /// Assemble a pipeline, validating the chunking and retrieval settings.
    pub fn new(retriever: Retriever<E, S>, synthesizer: Synthesizer<M>, config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            segmenter: Segmenter::new(config.chunking)?,
            retriever: retriever.with_overfetch_factor(config.retrieval.overfetch_factor),
            synthesizer,
            retrieval: config.retrieval,
        })
    }

    /// Segment, embed and store `text` as `doc`, replacing any chunks
    /// previously stored for the same document id.
    ///
    /// Returns the number of chunks stored. Nothing is written if embedding
    /// fails.
    pub fn ingest(&mut self, text: &str, doc: &Document) -> Result<usize> {
        let chunks = self.segmenter.segment(text, doc);
        self.store_chunks(doc, &chunks)
    }

    /// Like [`ingest`](Self::ingest) with a one-off chunking config.
    pub fn ingest_with(&mut self, text: &str, doc: &Document, config: &ChunkConfig) -> Result<usize> {
        let chunks = Segmenter::new(*config)?.segment(text, doc);
        self.store_chunks(doc, &chunks)
    }

    fn store_chunks(&mut self, doc: &Document, chunks: &[Chunk]) -> Result<usize> {
        let stored = self.retriever.replace_document(doc, chunks)?;
        info!(doc_id = %doc.id, doc_name = %doc.name, chunks = stored, "ingested document");
        Ok(stored)
    }

    /// Answer `question` from the stored chunks.
    ///
    /// `top_k` defaults to the configured value.
    pub async fn ask(
        &mut self,
        question: &str,
        top_k: Option<usize>,
        filter: Option<&DocFilter>,
    ) -> Result<Answer> {
        let top_k = top_k.unwrap_or(self.retrieval.top_k);
        let chunks = self.retriever.retrieve(question, top_k, filter)?;
        info!(top_k, retrieved = chunks.len(), "answering question");

        self.synthesizer.synthesize(question, &chunks).await
    }

    /// Remove a document from the store.
    pub fn forget(&mut self, doc_id: &str) -> Result<usize> {
        self.retriever.store_mut().delete_document(doc_id)
    }

    #[must_use]
    pub fn retriever(&self) -> &Retriever<E, S> {
        &self.retriever
    }

    pub fn retriever_mut(&mut self) -> &mut Retriever<E, S> {
        &mut self.retriever
    }

    #[must_use]
    pub fn synthesizer(&self) -> &Synthesizer<M> {
        &self.synthesizer
    }

    /// Persist pending store writes.
    pub fn flush(&mut self) -> Result<()> {
        self.retriever.store_mut().flush()
    }

    /// Flush and release every collaborator.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }
}
