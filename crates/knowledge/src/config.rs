//! Environment configuration for the knowledge base.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::chunk::DEFAULT_CHUNK_CHARS;
use crate::embedder::{Embedder, HashingEmbedder, HttpEmbedder};
use crate::error::KnowledgeError;
use crate::index::KnowledgeBase;

/// Default embedding model for the HTTP embedder.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Knowledge base settings.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeConfig {
    /// File or directory to index at startup.
    pub path: Option<PathBuf>,
    /// Base URL of an OpenAI-compatible embeddings endpoint.
    pub embedding_api_url: Option<String>,
    /// Bearer token for the embeddings endpoint.
    pub embedding_api_key: Option<String>,
    /// Embedding model name.
    pub embedding_model: Option<String>,
    /// Maximum characters per chunk.
    pub chunk_chars: Option<usize>,
}

impl KnowledgeConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `KB_PATH` - File or directory of `.txt`/`.md` documents
    /// - `EMBEDDING_API_URL` - Embeddings endpoint (default: local hashing embedder)
    /// - `EMBEDDING_API_KEY` - Bearer token for the endpoint
    /// - `EMBEDDING_MODEL` - Model name (default: text-embedding-3-small)
    /// - `KB_CHUNK_CHARS` - Max characters per chunk (default: 1200)
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            path: var("KB_PATH").map(PathBuf::from),
            embedding_api_url: var("EMBEDDING_API_URL"),
            embedding_api_key: var("EMBEDDING_API_KEY"),
            embedding_model: var("EMBEDDING_MODEL"),
            chunk_chars: var("KB_CHUNK_CHARS").and_then(|v| v.parse().ok()),
        }
    }

    /// Build the configured embedder.
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>, KnowledgeError> {
        match &self.embedding_api_url {
            Some(url) => {
                let model = self
                    .embedding_model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
                info!("Using HTTP embedder at {} (model {})", url, model);
                Ok(Arc::new(HttpEmbedder::new(
                    url.clone(),
                    self.embedding_api_key.clone(),
                    model,
                )?))
            }
            None => {
                info!("Using local hashing embedder");
                Ok(Arc::new(HashingEmbedder::default()))
            }
        }
    }

    /// Construct the knowledge base and load `path` if one is set.
    pub async fn open(&self) -> Result<KnowledgeBase, KnowledgeError> {
        let kb = KnowledgeBase::new(self.embedder()?)
            .with_chunk_chars(self.chunk_chars.unwrap_or(DEFAULT_CHUNK_CHARS));
        if let Some(path) = &self.path {
            kb.load_dir(path).await?;
        }
        Ok(kb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::VectorIndex;

    #[tokio::test]
    async fn test_open_without_path_is_empty() {
        let kb = KnowledgeConfig::default().open().await.unwrap();
        assert!(kb.is_empty());
    }

    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        std::env::set_var("KB_PATH", "/srv/kb");
        std::env::set_var("KB_CHUNK_CHARS", "800");
        std::env::remove_var("EMBEDDING_API_URL");
        let config = KnowledgeConfig::from_env();
        assert_eq!(config.path, Some(PathBuf::from("/srv/kb")));
        assert_eq!(config.chunk_chars, Some(800));
        assert!(config.embedding_api_url.is_none());

        std::env::set_var("KB_PATH", "  ");
        assert!(KnowledgeConfig::from_env().path.is_none());

        std::env::remove_var("KB_PATH");
        std::env::remove_var("KB_CHUNK_CHARS");
    }
}
