//! Text embedding using local models
//!
//! Uses the fastembed crate (ONNX runtime). The default model is
//! all-MiniLM-L6-v2; the BGE English family is also supported.
//!
//! # Model Details
//!
//! | Name                | Dimensions | Query prefix |
//! |---------------------|------------|--------------|
//! | `all-MiniLM-L6-v2`  | 384        | no           |
//! | `bge-small-en-v1.5` | 384        | yes          |
//! | `bge-base-en-v1.5`  | 768        | yes          |
//! | `bge-large-en-v1.5` | 1024       | yes          |
//!
//! # Usage
//!
//! ```ignore
//! use pagewise_lib::embed::{Embedder, FastEmbedder};
//!
//! let mut embedder = FastEmbedder::new(&config.embedding)?;
//!
//! // Embed documents (for indexing)
//! let doc_embeddings = embedder.embed_documents(&["Quarterly revenue...", "Risk factors..."])?;
//!
//! // Embed query (for searching)
//! let query_embedding = embedder.embed_query("What were the main risks?")?;
//! ```

use crate::Result;

/// Dense vector for one piece of text
pub type Embedding = Vec<f32>;

/// Turns chunk text and questions into vectors of a fixed dimension
pub trait Embedder: Send + Sync {
    /// Embed chunk texts for indexing, one vector per input in input order
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a question
    ///
    /// Asymmetric models (BGE) add their query instruction here, so callers
    /// never deal with prefixes.
    fn embed_query(&mut self, text: &str) -> Result<Embedding>;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

mod onnx;
pub use onnx::*;
