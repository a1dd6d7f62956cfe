//! Question-to-chunks retrieval
//!
//! Combines an embedder and a vector store: chunks go in through
//! [`Retriever::replace_document`], questions come out as ranked chunks through
//! [`Retriever::retrieve`].
//!
//! # Usage
//!
//! ```ignore
//! use pagewise_lib::retrieve::Retriever;
//! use pagewise_lib::store::DocFilter;
//!
//! let mut retriever = Retriever::new(embedder, store);
//! retriever.replace_document(&doc, &chunks)?;
//!
//! // best 5 chunks from the whole corpus
//! let chunks = retriever.retrieve("What is the notice period?", 5, None)?;
//!
//! // best 5 chunks from one document, chosen among 15 candidates
//! let filter = DocFilter::from_iter(["contract-2024"]);
//! let chunks = retriever.retrieve("What is the notice period?", 5, Some(&filter))?;
//! ```

use tracing::{debug, info};

use crate::chunk::{Chunk, Document};
use crate::config::OVERFETCH_FACTOR;
use crate::embed::{Embedder, Embedding};
use crate::store::{DocFilter, SearchResult, VectorStore};
use crate::{Error, Result};

/// Embeds questions, searches the store, and applies the filter and `top_k`
/// policy. The store's ranking is kept as is.
pub struct Retriever<E: Embedder, S: VectorStore> {
    embedder: E,
    store: S,
    overfetch_factor: usize,
}

impl<E: Embedder, S: VectorStore> Retriever<E, S> {
    /// Create a retriever using [`OVERFETCH_FACTOR`].
    #[must_use]
    pub fn new(embedder: E, store: S) -> Self {
        Self {
            embedder,
            store,
            overfetch_factor: OVERFETCH_FACTOR,
        }
    }

    /// Override the candidate multiplier used when a filter is active.
    #[must_use]
    pub fn with_overfetch_factor(mut self, factor: usize) -> Self {
        self.overfetch_factor = factor.max(1);
        self
    }

    /// Number of candidates to request from the store for `top_k` results.
    #[must_use]
    pub fn candidate_count(&self, top_k: usize, filtered: bool) -> usize {
        if filtered {
            top_k.saturating_mul(self.overfetch_factor)
        } else {
            top_k
        }
    }

    /// Replace everything stored for `doc` with `chunks`.
    ///
    /// The new set is embedded and upserted before anything is removed, so a
    /// failure at either step leaves the previous chunks of `doc` in place.
    /// Only chunks beyond the new set's length are deleted afterwards.
    pub fn replace_document(&mut self, doc: &Document, chunks: &[Chunk]) -> Result<usize> {
        for (position, chunk) in chunks.iter().enumerate() {
            if chunk.doc_id != doc.id {
                return Err(Error::Chunking(format!(
                    "chunk '{}' does not belong to document '{}'",
                    chunk.id, doc.id
                )));
            }
            if chunk.chunk_index != position {
                return Err(Error::Chunking(format!(
                    "chunk '{}' has index {}, expected {position}",
                    chunk.id, chunk.chunk_index
                )));
            }
        }

        let embeddings = self.embed_chunks(chunks)?;
        self.store.upsert(chunks, &embeddings)?;
        let stale = self.store.truncate_document(&doc.id, chunks.len())?;

        info!(
            doc_id = %doc.id,
            chunks = chunks.len(),
            stale,
            "indexed document"
        );
        Ok(chunks.len())
    }

    fn embed_chunks(&mut self, chunks: &[Chunk]) -> Result<Vec<Embedding>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        self.embedder.embed_documents(&texts)
    }

    /// Search with scores. Same policy as [`retrieve`](Self::retrieve).
    pub fn search(
        &mut self,
        query: &str,
        top_k: usize,
        filter: Option<&DocFilter>,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".into()));
        }

        let query_embedding = self.embedder.embed_query(query)?;
        let k = self.candidate_count(top_k, filter.is_some());
        let mut results = self.store.search(&query_embedding, k, filter)?;
        let candidates = results.len();

        // the filter is a hard constraint, whatever the backend did with it
        if let Some(filter) = filter {
            results.retain(|r| filter.contains(&r.chunk.doc_id));
        }
        results.truncate(top_k);

        debug!(requested = k, candidates, returned = results.len(), "retrieved chunks");
        Ok(results)
    }

    /// Find the chunks most relevant to `query`, best match first.
    ///
    /// Returns at most `top_k` chunks. An empty vector means nothing matched
    /// and is not an error.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] for `top_k == 0`; embedding and store failures
    /// are propagated unchanged.
    pub fn retrieve(
        &mut self,
        query: &str,
        top_k: usize,
        filter: Option<&DocFilter>,
    ) -> Result<Vec<Chunk>> {
        Ok(self
            .search(query, top_k, filter)?
            .into_iter()
            .map(|r| r.chunk)
            .collect())
    }

    /// Returns the number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no chunks are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Returns a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a mutable reference to the store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
