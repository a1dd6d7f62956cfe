use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

const BGE_QUERY_PREFIX: &str = "Represent this sentence for searching relevant passages: ";

/// A supported embedding model and how to talk to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: &'static str,
    pub model: EmbeddingModel,
    pub dimension: usize,
    pub query_prefix: Option<&'static str>,
}

/// Look up a model by name. Hub prefixes (`sentence-transformers/`, `BAAI/`)
/// and case are ignored.
pub fn resolve_model(name: &str) -> Result<ModelInfo> {
    let short = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();

    let info = match short.as_str() {
        "all-minilm-l6-v2" => ModelInfo {
            name: "sentence-transformers/all-MiniLM-L6-v2",
            model: EmbeddingModel::AllMiniLML6V2,
            dimension: 384,
            query_prefix: None,
        },
        "bge-small-en-v1.5" => ModelInfo {
            name: "BAAI/bge-small-en-v1.5",
            model: EmbeddingModel::BGESmallENV15,
            dimension: 384,
            query_prefix: Some(BGE_QUERY_PREFIX),
        },
        "bge-base-en-v1.5" => ModelInfo {
            name: "BAAI/bge-base-en-v1.5",
            model: EmbeddingModel::BGEBaseENV15,
            dimension: 768,
            query_prefix: Some(BGE_QUERY_PREFIX),
        },
        "bge-large-en-v1.5" => ModelInfo {
            name: "BAAI/bge-large-en-v1.5",
            model: EmbeddingModel::BGELargeENV15,
            dimension: 1024,
            query_prefix: Some(BGE_QUERY_PREFIX),
        },
        _ => {
            return Err(Error::InvalidConfig(format!(
                "unsupported embedding model '{name}'"
            )))
        }
    };
    Ok(info)
}

/// Local embedder backed by fastembed.
///
/// The model is downloaded on first use and cached by fastembed.
pub struct FastEmbedder {
    model: TextEmbedding,
    info: ModelInfo,
}

impl FastEmbedder {
    /// Load the model named in `config`.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let info = resolve_model(&config.model)?;
        debug!(model = info.name, "loading embedding model");

        let opts = InitOptions::new(info.model.clone())
            .with_show_download_progress(config.show_download_progress);

        TextEmbedding::try_new(opts)
            .map(|model| Self { model, info })
            .map_err(|e| Error::Embedding(e.to_string()))
    }

    #[must_use]
    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

impl Embedder for FastEmbedder {
    fn model_name(&self) -> &str {
        self.info.name
    }

    fn dimension(&self) -> usize {
        self.info.dimension
    }

    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .embed(texts, None)
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "model returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        let query_text = query_text(&self.info, text);

        self.model
            .embed(vec![query_text], None)
            .map_err(|e| Error::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("model returned no embeddings".to_string()))
    }
}

fn query_text(info: &ModelInfo, text: &str) -> String {
    match info.query_prefix {
        Some(prefix) => format!("{prefix}{text}"),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default_model() {
        let info = resolve_model(&EmbeddingConfig::default().model).unwrap();
        assert_eq!(info.dimension, 384);
        assert!(info.query_prefix.is_none());
    }

    #[test]
    fn test_resolve_ignores_hub_prefix_and_case() {
        let info = resolve_model("BAAI/BGE-Large-EN-v1.5").unwrap();
        assert_eq!(info.model, EmbeddingModel::BGELargeENV15);
        assert_eq!(info.dimension, 1024);
    }

    #[test]
    fn test_resolve_unknown_model() {
        let err = resolve_model("word2vec").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_query_prefix_only_for_bge() {
        let bge = resolve_model("bge-small-en-v1.5").unwrap();
        let mini = resolve_model("all-MiniLM-L6-v2").unwrap();

        assert!(query_text(&bge, "who?").starts_with("Represent this sentence"));
        assert_eq!(query_text(&mini, "who?"), "who?");
    }

    #[test]
    #[ignore] // Requires model download, run with: cargo test -- --ignored
    fn test_similar_texts_embed_closer() {
        let mut embedder = FastEmbedder::new(&EmbeddingConfig {
            show_download_progress: false,
            ..EmbeddingConfig::default()
        })
        .unwrap();

        let docs = embedder
            .embed_documents(&["The invoice is due in thirty days.", "Penguins live in Antarctica."])
            .unwrap();
        let query = embedder.embed_query("When must the invoice be paid?").unwrap();

        assert_eq!(query.len(), embedder.dimension());
        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&query, &docs[0]) > dot(&query, &docs[1]));
    }
}
