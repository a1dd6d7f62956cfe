//! Error types for Pagewise

use std::fmt;

use thiserror::Error;

/// Result type alias for Pagewise operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading text out of a source file
    Extract,
    /// Splitting text into chunks
    Segment,
    /// Computing embeddings
    Embed,
    /// Writing to or querying the vector index
    Index,
    /// Producing the final answer
    Synthesize,
    /// Loading or validating configuration
    Config,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Segment => "segment",
            Stage::Embed => "embed",
            Stage::Index => "index",
            Stage::Synthesize => "synthesize",
            Stage::Config => "config",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in Pagewise operations
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to extract text from a source document
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Failed to chunk a document
    #[error("chunking error: {0}")]
    Chunking(String),

    /// Failed to load or run the embedding model
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Failed to store or retrieve from the vector index
    #[error("index error: {0}")]
    Index(String),

    /// The language model call failed or returned garbage
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Invalid configuration or caller input
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Filesystem I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization failure
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// The pipeline stage this error belongs to.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Error::Extraction(_) => Stage::Extract,
            Error::Chunking(_) => Stage::Segment,
            Error::Embedding(_) => Stage::Embed,
            Error::Index(_) => Stage::Index,
            Error::Synthesis(_) => Stage::Synthesize,
            Error::InvalidConfig(_) | Error::Io(_) | Error::Toml(_) => Stage::Config,
        }
    }
}
