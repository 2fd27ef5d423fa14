//! Knowledge base for retrieval-augmented turns.
//!
//! Documents are chunked, embedded and held in memory. The orchestrator sees
//! only the [`VectorIndex`] trait, so any store with a similarity search can
//! stand in for [`KnowledgeBase`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use knowledge::{HashingEmbedder, KnowledgeBase, VectorIndex};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), knowledge::KnowledgeError> {
//! let kb = KnowledgeBase::new(Arc::new(HashingEmbedder::default()));
//! kb.add_document("faq.md", "Refunds are issued within 30 days.").await?;
//!
//! let hits = kb.similarity_search("refund window", 4).await?;
//! assert_eq!(hits.len(), 1);
//! kb.close().await;
//! # Ok(())
//! # }
//! ```

mod chunk;
mod config;
mod embedder;
mod error;
mod index;

pub use chunk::{chunk_text, DEFAULT_CHUNK_CHARS};
pub use config::KnowledgeConfig;
pub use embedder::{cosine_similarity, Embedder, HashingEmbedder, HttpEmbedder, DEFAULT_HASH_DIMENSION};
pub use error::KnowledgeError;
pub use index::{KnowledgeBase, ScoredPassage, VectorIndex};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
