//! Vector index trait and the in-memory knowledge base.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chunk::{chunk_text, DEFAULT_CHUNK_CHARS};
use crate::embedder::{cosine_similarity, Embedder};
use crate::error::KnowledgeError;

/// Files larger than this are skipped when loading a directory.
const MAX_FILE_BYTES: u64 = 512 * 1024;

/// Chunks are embedded in batches of this size.
const EMBED_BATCH: usize = 32;

/// One passage returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    /// Where the passage came from (file path plus chunk number).
    pub source: String,
    /// Passage text.
    pub text: String,
    /// Similarity in `[0, 1]`.
    pub score: f32,
}

/// A searchable passage index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-`k` passages for `query`, highest score first.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredPassage>, KnowledgeError>;

    /// Number of indexed passages.
    fn len(&self) -> usize;

    /// Whether the index holds no passages.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Entry {
    source: String,
    text: String,
    vector: Vec<f32>,
}

/// In-memory knowledge base.
///
/// Lifecycle: construct with an embedder, [`load_dir`](Self::load_dir) (or
/// [`add_document`](Self::add_document)) at startup, share behind an `Arc`,
/// and [`close`](Self::close) on shutdown. Searches after `close` fail with
/// [`KnowledgeError::Closed`].
pub struct KnowledgeBase {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<Entry>>,
    count: AtomicUsize,
    closed: AtomicBool,
    chunk_chars: usize,
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
            count: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }

    /// Set the maximum characters per chunk.
    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    /// Chunk, embed and index one document. Returns the number of chunks added.
    pub async fn add_document(&self, source: &str, text: &str) -> Result<usize, KnowledgeError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(KnowledgeError::Closed);
        }

        let chunks = chunk_text(text, self.chunk_chars);
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut new_entries = Vec::with_capacity(chunks.len());
        for (batch_index, batch) in chunks.chunks(EMBED_BATCH).enumerate() {
            let vectors = self.embedder.embed(batch).await?;
            if vectors.len() != batch.len() {
                return Err(KnowledgeError::Embedding(format!(
                    "embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }
            for (offset, (text, vector)) in batch.iter().zip(vectors).enumerate() {
                new_entries.push(Entry {
                    source: format!("{}#{}", source, batch_index * EMBED_BATCH + offset),
                    text: text.clone(),
                    vector,
                });
            }
        }

        let added = new_entries.len();
        let mut entries = self.entries.write().await;
        entries.extend(new_entries);
        self.count.store(entries.len(), Ordering::SeqCst);
        debug!("Indexed {} chunks from {}", added, source);
        Ok(added)
    }

    /// Load every `.txt`/`.md`/`.markdown` file under `path` (or `path`
    /// itself if it is a file). Returns the number of chunks added.
    ///
    /// Unreadable, empty and oversized files are skipped with a warning.
    pub async fn load_dir(&self, path: impl AsRef<Path>) -> Result<usize, KnowledgeError> {
        let root = path.as_ref().to_path_buf();
        let documents = tokio::task::spawn_blocking(move || read_documents(&root))
            .await
            .map_err(|e| KnowledgeError::Io(std::io::Error::other(e.to_string())))??;

        let mut total = 0;
        for (source, text) in documents {
            total += self.add_document(&source, &text).await?;
        }
        info!("Knowledge base loaded: {} chunks", total);
        Ok(total)
    }

    /// Drop all passages and refuse further use.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let mut entries = self.entries.write().await;
        entries.clear();
        self.count.store(0, Ordering::SeqCst);
        info!("Knowledge base closed");
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn read_documents(root: &Path) -> Result<Vec<(String, String)>, KnowledgeError> {
    if root.is_file() {
        return Ok(read_document(root).into_iter().collect());
    }
    if !root.is_dir() {
        return Err(KnowledgeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Knowledge base path not found: {}", root.display()),
        )));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_supported_path(path))
        .collect();
    paths.sort();

    Ok(paths.iter().filter_map(|path| read_document(path)).collect())
}

fn read_document(path: &Path) -> Option<(String, String)> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            return None;
        }
    };
    if metadata.len() == 0 || metadata.len() > MAX_FILE_BYTES {
        debug!("Skipping {} ({} bytes)", path.display(), metadata.len());
        return None;
    }

    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => Some((path.display().to_string(), text)),
        Ok(_) => None,
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            None
        }
    }
}

fn is_supported_path(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => matches!(ext.to_ascii_lowercase().as_str(), "txt" | "md" | "markdown"),
        None => false,
    }
}

#[async_trait]
impl VectorIndex for KnowledgeBase {
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredPassage>, KnowledgeError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(KnowledgeError::Closed);
        }
        if k == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| KnowledgeError::Embedding("no vector for query".to_string()))?;

        let entries = self.entries.read().await;
        let mut scored: Vec<ScoredPassage> = entries
            .iter()
            .map(|entry| ScoredPassage {
                source: entry.source.clone(),
                text: entry.text.clone(),
                score: cosine_similarity(&query_vector, &entry.vector),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}
