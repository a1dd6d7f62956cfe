//! Deterministic fakes for the external collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::answer::{ChatMessage, LanguageModel};
use crate::chunk::Chunk;
use crate::embed::{Embedder, Embedding};
use crate::store::{DocFilter, DocumentSummary, MemoryStore, SearchResult, VectorStore};
use crate::{Error, Result};

/// Embeds text as keyword counts over a fixed vocabulary.
pub struct KeywordEmbedder {
    vocab: Vec<&'static str>,
    pub fail: bool,
    pub query_calls: usize,
    pub document_calls: usize,
}

impl KeywordEmbedder {
    pub fn new(vocab: &[&'static str]) -> Self {
        Self {
            vocab: vocab.to_vec(),
            fail: false,
            query_calls: 0,
            document_calls: 0,
        }
    }

    pub fn failing(vocab: &[&'static str]) -> Self {
        Self {
            fail: true,
            ..Self::new(vocab)
        }
    }

    fn vector(&self, text: &str) -> Embedding {
        let text = text.to_lowercase();
        self.vocab
            .iter()
            .map(|word| text.matches(word).count() as f32)
            .collect()
    }
}

impl Embedder for KeywordEmbedder {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.document_calls += 1;
        if self.fail {
            return Err(Error::Embedding("gateway unavailable".into()));
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        self.query_calls += 1;
        if self.fail {
            return Err(Error::Embedding("gateway unavailable".into()));
        }
        Ok(self.vector(text))
    }

    fn dimension(&self) -> usize {
        self.vocab.len()
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// Memory store that records the `k` of the last search and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub fail_search: bool,
    pub fail_upsert: bool,
    last_k: AtomicUsize,
}

impl RecordingStore {
    pub fn last_k(&self) -> usize {
        self.last_k.load(Ordering::SeqCst)
    }
}

impl VectorStore for RecordingStore {
    fn upsert(&mut self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> {
        if self.fail_upsert {
            return Err(Error::Index("disk full".into()));
        }
        self.inner.upsert(chunks, embeddings)
    }

    fn search(
        &self,
        query_embedding: &Embedding,
        k: usize,
        filter: Option<&DocFilter>,
    ) -> Result<Vec<SearchResult>> {
        self.last_k.store(k, Ordering::SeqCst);
        if self.fail_search {
            return Err(Error::Index("connection reset".into()));
        }
        self.inner.search(query_embedding, k, filter)
    }

    fn truncate_document(&mut self, doc_id: &str, len: usize) -> Result<usize> {
        self.inner.truncate_document(doc_id, len)
    }

    fn documents(&self) -> Vec<DocumentSummary> {
        self.inner.documents()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }
}

/// Language model that echoes a fixed reply and records every prompt.
pub struct ScriptedModel {
    reply: std::result::Result<String, String>,
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        self.reply.clone().map_err(Error::Synthesis)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
