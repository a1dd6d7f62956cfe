//! Grounded answer synthesis
//!
//! A [`Synthesizer`] turns a question and its retrieved chunks into an
//! [`Answer`] by prompting a [`LanguageModel`] with the chunks as the only
//! allowed context. Sources are the distinct documents the chunks came from.
//!
//! With no chunks the model is never called and the fixed
//! [`NOT_FOUND_ANSWER`] is returned.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::Chunk;
use crate::Result;

/// Answer returned when retrieval found nothing.
pub const NOT_FOUND_ANSWER: &str =
    "I couldn't find any relevant information in the uploaded documents.";

const SYSTEM_PROMPT: &str = "You are a helpful assistant that only uses provided context.";

/// A document an answer drew on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub doc_id: String,
    pub doc_name: String,
}

/// Answer text plus the documents it is based on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    /// Unique by `doc_id`, in order of first appearance in the context
    pub sources: Vec<Source>,
}

impl Answer {
    /// The fixed answer for an empty context.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            answer: NOT_FOUND_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Role in the chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a chat conversation with the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Trait for chat-style language models
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send the conversation and return the model's reply text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

/// Produces grounded answers from retrieved chunks.
pub struct Synthesizer<M: LanguageModel> {
    model: M,
}

impl<M: LanguageModel> Synthesizer<M> {
    #[must_use]
    pub fn new(model: M) -> Self {
        Self { model }
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Answer `query` from `chunks` (best match first).
    ///
    /// # Errors
    ///
    /// Model failures are returned as [`crate::Error::Synthesis`]; there is
    /// no degraded answer.
    pub async fn synthesize(&self, query: &str, chunks: &[Chunk]) -> Result<Answer> {
        if chunks.is_empty() {
            debug!("no chunks retrieved, skipping language model");
            return Ok(Answer::not_found());
        }

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(query, chunks)),
        ];
        let answer = self.model.complete(&messages).await?;

        Ok(Answer {
            answer: answer.trim().to_string(),
            sources: collect_sources(chunks),
        })
    }
}

/// Chunks joined by blank lines, each tagged with its document name.
#[must_use]
pub fn build_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("[From: {}]\n{}", c.doc_name, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The user prompt restricting the model to the retrieved snippets.
#[must_use]
pub fn build_prompt(query: &str, chunks: &[Chunk]) -> String {
    format!(
        "You are an AI assistant that answers questions based on the provided document snippets.
Please answer the following question using ONLY the information in the document snippets below.
If you cannot find the answer in the provided snippets, say \"I couldn't find the answer in the provided documents.\"
Always cite the document sources in your answer.

Document snippets:
{context}

Question: {query}
",
        context = build_context(chunks),
    )
}

/// Distinct documents of `chunks`, first appearance wins.
#[must_use]
pub fn collect_sources(chunks: &[Chunk]) -> Vec<Source> {
    let mut sources: Vec<Source> = Vec::new();
    for chunk in chunks {
        if !sources.iter().any(|s| s.doc_id == chunk.doc_id) {
            sources.push(Source {
                doc_id: chunk.doc_id.clone(),
                doc_name: chunk.doc_name.clone(),
            });
        }
    }
    sources
}

mod openai;
pub use openai::*;
