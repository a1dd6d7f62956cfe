//! Pagewise - ask questions about your documents
//!
//! # Architecture
//!
//! ```text
//! Document -> Extract -> Segmenter -> Embedder -> Store
//!                                                  |
//! Question -> Embedder -> Retriever <--------------+
//!                             |
//!                        Synthesizer -> Answer + sources
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pagewise_lib::{
//!     answer::{OpenAiModel, Synthesizer},
//!     chunk::Document,
//!     config::Config,
//!     embed::FastEmbedder,
//!     pipeline::Pipeline,
//!     retrieve::Retriever,
//!     store::MemoryStore,
//! };
//!
//! let config = Config::default();
//! let retriever = Retriever::new(
//!     FastEmbedder::new(&config.embedding)?,
//!     MemoryStore::open(&config.store.path)?,
//! );
//! let synthesizer = Synthesizer::new(OpenAiModel::new(&config.llm)?);
//! let mut pipeline = Pipeline::new(retriever, synthesizer, &config)?;
//!
//! // Index a document
//! pipeline.ingest(&text, &Document::new("annual-report", "annual-report.pdf"))?;
//!
//! // Ask
//! let answer = pipeline.ask("What was the operating margin?", None, None).await?;
//! pipeline.close()?;
//! ```

pub mod answer;
pub mod chunk;
pub mod config;
pub mod embed;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod retrieve;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result, Stage};
