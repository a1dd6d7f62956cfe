//! Document chunking strategies
//!
//! Three chunkers share the [`Chunker`] trait:
//! - [`ParagraphChunker`]: packs blank-line separated paragraphs up to a
//!   character budget, carrying trailing words into the next chunk
//! - [`FixedSizeChunker`]: slides a fixed character window with overlap
//! - [`Segmenter`]: paragraph packing first, fixed windows when the text has
//!   no usable paragraph structure (the default for ingestion)
//!
//! Every chunker numbers its output `0..n` and derives ids as
//! `"{doc_id}_{index}"`, so the same input always yields the same chunk set.
//!
//! # Usage
//!
//! ```ignore
//! use pagewise_lib::chunk::{segment, Document};
//! use pagewise_lib::config::ChunkConfig;
//!
//! let doc = Document::new("report-2024", "report.pdf");
//! let chunks = segment(&text, &doc, &ChunkConfig::default());
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ChunkConfig;
use crate::{Error, Result};

/// Identity of an ingested document.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct Document {
    /// Stable, caller-assigned identifier
    pub id: String,
    /// Display name (usually the file name)
    pub name: String,
}

impl Document {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The atomic retrievable unit.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Chunk {
    /// `"{doc_id}_{chunk_index}"`
    pub id: String,
    /// Trimmed, non-empty text content
    pub text: String,
    /// Owning document id
    pub doc_id: String,
    /// Owning document display name
    pub doc_name: String,
    /// Position within the document's chunk sequence (0-indexed)
    pub chunk_index: usize,
}

impl Chunk {
    /// Build a chunk for `doc` at `chunk_index`.
    ///
    /// The text is trimmed; whitespace-only text is rejected.
    pub fn new(doc: &Document, chunk_index: usize, text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Chunking(format!(
                "chunk {chunk_index} of '{}' has no text",
                doc.id
            )));
        }

        Ok(Self {
            id: chunk_id(&doc.id, chunk_index),
            text: text.to_owned(),
            doc_id: doc.id.clone(),
            doc_name: doc.name.clone(),
            chunk_index,
        })
    }

    /// The document this chunk belongs to.
    #[must_use]
    pub fn document(&self) -> Document {
        Document::new(self.doc_id.clone(), self.doc_name.clone())
    }
}

/// Deterministic chunk id for a document position.
#[must_use]
pub fn chunk_id(doc_id: &str, chunk_index: usize) -> String {
    format!("{doc_id}_{chunk_index}")
}

/// Trait for document chunking strategies
pub trait Chunker: Send + Sync {
    /// Split content into chunks
    ///
    /// # Arguments
    /// * `content` - The text content to chunk
    /// * `doc` - The document the chunks belong to
    ///
    /// # Returns
    /// Chunks in reading order, indexed from 0 without gaps
    fn chunk(&self, content: &str, doc: &Document) -> Vec<Chunk>;

    /// Returns the name of this chunking strategy
    fn name(&self) -> &str;
}

/// Split `text` with the two-tier strategy described on [`Segmenter`].
///
/// `config` is assumed valid; see [`ChunkConfig::validate`].
#[must_use]
pub fn segment(text: &str, doc: &Document, config: &ChunkConfig) -> Vec<Chunk> {
    Segmenter::from_config(*config).segment(text, doc)
}

/// Collects emitted text into numbered chunks, dropping blank windows.
pub(crate) struct ChunkSink<'a> {
    doc: &'a Document,
    chunks: Vec<Chunk>,
}

impl<'a> ChunkSink<'a> {
    pub(crate) fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            chunks: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, text: &str) {
        // blank text is the only way Chunk::new fails
        if let Ok(chunk) = Chunk::new(self.doc, self.chunks.len(), text) {
            self.chunks.push(chunk);
        }
    }

    pub(crate) fn finish(self) -> Vec<Chunk> {
        self.chunks
    }
}

/// Length in characters, which is what every size budget counts.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

mod fixed;
mod paragraph;
mod segmenter;

pub use fixed::*;
pub use paragraph::*;
pub use segmenter::*;
