//! Vector storage backends
//!
//! # Storage Model
//!
//! Each stored item consists of:
//! - Chunk: id, text and the `doc_id` / `doc_name` / `chunk_index` metadata
//! - Embedding: the vector representation
//!
//! Writes are upserts keyed by chunk id. Searches return results best match
//! first and may be restricted to a set of documents with a [`DocFilter`].
//!
//! # Usage
//!
//! ```ignore
//! use pagewise_lib::store::{DocFilter, MemoryStore, VectorStore};
//!
//! let mut store = MemoryStore::open("pagewise_index.json")?;
//!
//! // Insert chunks with their embeddings
//! store.upsert(&chunks, &embeddings)?;
//!
//! // Search by vector similarity, only within one document
//! let filter = DocFilter::from_iter(["handbook"]);
//! let results = store.search(&query_embedding, 5, Some(&filter))?;
//!
//! store.flush()?;
//! ```

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, Document};
use crate::embed::Embedding;
use crate::Result;

/// A search result with similarity score
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Similarity score (higher is more similar)
    /// For cosine similarity: -1.0 to 1.0
    pub score: f32,
}

// Orders by score, then by reverse chunk id so that a descending sort puts
// equal scores in ascending id order.
impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.chunk.id.cmp(&self.chunk.id))
    }
}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchResult {}

/// Set of document ids a search is restricted to.
///
/// An empty filter matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocFilter(BTreeSet<String>);

impl DocFilter {
    #[must_use]
    pub fn contains(&self, doc_id: &str) -> bool {
        self.0.contains(doc_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for DocFilter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A stored document and how many chunks it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub document: Document,
    pub chunk_count: usize,
}

/// Trait for vector storage backends
pub trait VectorStore: Send + Sync {
    /// Insert or replace chunks with their embeddings
    ///
    /// # Arguments
    /// * `chunks` - The text chunks to store
    /// * `embeddings` - Corresponding embeddings (must be same length)
    ///
    /// Chunks whose id is already stored are overwritten.
    fn upsert(&mut self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()>;

    /// Search for similar chunks
    ///
    /// # Arguments
    /// * `query_embedding` - The query vector
    /// * `k` - Maximum number of results to return
    /// * `filter` - Only consider chunks of these documents
    ///
    /// # Returns
    /// Up to `k` results sorted by similarity (highest first)
    fn search(
        &self,
        query_embedding: &Embedding,
        k: usize,
        filter: Option<&DocFilter>,
    ) -> Result<Vec<SearchResult>>;

    /// Remove the chunks of a document whose `chunk_index` is `len` or
    /// higher, returning how many were removed
    fn truncate_document(&mut self, doc_id: &str, len: usize) -> Result<usize>;

    /// Remove every chunk of a document, returning how many were removed
    fn delete_document(&mut self, doc_id: &str) -> Result<usize> {
        self.truncate_document(doc_id, 0)
    }

    /// List stored documents, ordered by document id
    fn documents(&self) -> Vec<DocumentSummary>;

    /// Get total number of stored chunks
    fn len(&self) -> usize;

    /// Check if store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all stored data
    fn clear(&mut self);

    /// Persist pending writes. Backends without persistence do nothing.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

mod memory;

pub use memory::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, score: f32) -> SearchResult {
        let doc = Document::new("d", "d");
        let mut chunk = Chunk::new(&doc, 0, "text").unwrap();
        chunk.id = id.to_string();
        SearchResult { chunk, score }
    }

    #[test]
    fn test_result_ordering() {
        let mut results = vec![result("b", 0.5), result("c", 0.9), result("a", 0.5)];
        results.sort_by(|a, b| b.cmp(a));

        let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_equal_scores_different_ids_not_equal() {
        assert_ne!(result("a", 0.5), result("b", 0.5));
        assert_eq!(result("a", 0.5), result("a", 0.5));
    }

    #[test]
    fn test_doc_filter() {
        let filter: DocFilter = ["docA", "docB"].into_iter().collect();

        assert!(filter.contains("docA"));
        assert!(!filter.contains("docC"));
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.iter().collect::<Vec<_>>(), vec!["docA", "docB"]);
        assert!(DocFilter::default().is_empty());
    }
}
