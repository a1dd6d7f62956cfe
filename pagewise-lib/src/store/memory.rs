use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chunk::Chunk;
use crate::embed::Embedding;
use crate::store::{DocFilter, DocumentSummary, SearchResult, VectorStore};
use crate::{Error, Result};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    chunk: Chunk,
    embedding: Embedding,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    entries: Vec<Entry>,
}

/// In-memory vector store with optional JSON snapshot persistence.
///
/// Uses brute-force cosine similarity search. Suitable for small corpora
/// (< 10k chunks). When opened on a path, [`VectorStore::flush`] writes the
/// whole store back to that file.
pub struct MemoryStore {
    entries: HashMap<String, Entry>,
    dimension: Option<usize>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            dimension: None,
            path: None,
            dirty: false,
        }
    }

    /// Open a store backed by a snapshot file.
    ///
    /// A missing file yields an empty store; the file is created on the first
    /// flush.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut store = Self::new();

        if path.exists() {
            let file = File::open(&path)
                .map_err(|e| Error::Index(format!("cannot open {}: {e}", path.display())))?;
            let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
                .map_err(|e| Error::Index(format!("corrupt snapshot {}: {e}", path.display())))?;

            if snapshot.version != SNAPSHOT_VERSION {
                return Err(Error::Index(format!(
                    "snapshot {} has version {}, expected {SNAPSHOT_VERSION}",
                    path.display(),
                    snapshot.version
                )));
            }

            for entry in snapshot.entries {
                store.check_dimension(entry.embedding.len())?;
                store.dimension = Some(entry.embedding.len());
                store.entries.insert(entry.chunk.id.clone(), entry);
            }
            info!(path = %path.display(), chunks = store.entries.len(), "loaded index snapshot");
        } else {
            debug!(path = %path.display(), "no snapshot yet, starting empty");
        }

        store.path = Some(path);
        Ok(store)
    }

    /// Snapshot file this store flushes to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Dimension of the stored embeddings, once anything has been stored.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn check_dimension(&self, len: usize) -> Result<()> {
        match self.dimension {
            Some(dim) if dim != len => Err(Error::Index(format!(
                "embedding has {len} dimensions, index holds {dim}"
            ))),
            _ => Ok(()),
        }
    }

    fn write_snapshot(&self, path: &Path) -> Result<()> {
        let io_err = |e: std::io::Error| Error::Index(format!("cannot write {}: {e}", path.display()));

        // stable order keeps snapshots diffable
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            (&a.chunk.doc_id, a.chunk.chunk_index).cmp(&(&b.chunk.doc_id, b.chunk.chunk_index))
        });

        #[derive(Serialize)]
        struct SnapshotRef<'a> {
            version: u32,
            entries: Vec<&'a Entry>,
        }

        let tmp = path.with_extension("tmp");
        let mut writer = BufWriter::new(File::create(&tmp).map_err(io_err)?);
        serde_json::to_writer(
            &mut writer,
            &SnapshotRef {
                version: SNAPSHOT_VERSION,
                entries,
            },
        )
        .map_err(|e| Error::Index(format!("cannot serialize snapshot: {e}")))?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        fs::rename(&tmp, path).map_err(io_err)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorStore for MemoryStore {
    fn upsert(&mut self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::Index(format!(
                "got {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        // validate the whole batch before touching the map
        let mut dimension = self.dimension;
        for embedding in embeddings {
            match dimension {
                Some(dim) if dim != embedding.len() => {
                    return Err(Error::Index(format!(
                        "embedding has {} dimensions, index holds {dim}",
                        embedding.len()
                    )))
                }
                Some(_) => {}
                None => dimension = Some(embedding.len()),
            }
        }
        self.dimension = dimension;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            self.entries.insert(
                chunk.id.clone(),
                Entry {
                    chunk: chunk.clone(),
                    embedding: embedding.clone(),
                },
            );
        }
        self.dirty |= !chunks.is_empty();
        Ok(())
    }

    fn search(
        &self,
        query: &Embedding,
        k: usize,
        filter: Option<&DocFilter>,
    ) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(query.len())?;

        let mut results = BinaryHeap::with_capacity(self.entries.len());

        for entry in self.entries.values() {
            if filter.is_some_and(|f| !f.contains(&entry.chunk.doc_id)) {
                continue;
            }

            results.push(SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.embedding),
            });
        }

        Ok(results
            .into_sorted_vec()
            .into_iter()
            .rev()
            .take(k)
            .collect())
    }

    fn truncate_document(&mut self, doc_id: &str, len: usize) -> Result<usize> {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.chunk.doc_id != doc_id || entry.chunk.chunk_index < len);
        let removed = before - self.entries.len();

        self.dirty |= removed > 0;
        if self.entries.is_empty() {
            self.dimension = None;
        }
        Ok(removed)
    }

    fn documents(&self) -> Vec<DocumentSummary> {
        let mut docs: BTreeMap<&str, DocumentSummary> = BTreeMap::new();
        for entry in self.entries.values() {
            docs.entry(entry.chunk.doc_id.as_str())
                .or_insert_with(|| DocumentSummary {
                    document: entry.chunk.document(),
                    chunk_count: 0,
                })
                .chunk_count += 1;
        }
        docs.into_values().collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.dirty |= !self.entries.is_empty();
        self.entries.clear();
        self.dimension = None;
    }

    fn flush(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        self.write_snapshot(path)?;
        debug!(path = %path.display(), chunks = self.entries.len(), "flushed index snapshot");
        self.dirty = false;
        Ok(())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
