//! Context acquisition: caller context, knowledge-base retrieval, or nothing.

use std::sync::Arc;

use knowledge::{ScoredPassage, VectorIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::turn::TurnRequest;

/// Header for caller-supplied context.
pub const PROVIDED_CONTEXT_HEADER: &str = "[PROVIDED CONTEXT]";

/// Header for knowledge-base passages.
pub const KNOWLEDGE_CONTEXT_HEADER: &str = "[KNOWLEDGE BASE CONTEXT]";

/// Default number of passages fetched per search.
pub const DEFAULT_TOP_K: usize = 4;

/// Default minimum similarity a passage needs to be used.
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.7;

/// Which kind of context a turn used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Explicit,
    Retrieved,
    None,
}

/// At most one source of context for a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextBundle {
    /// Caller text, used verbatim.
    Explicit(String),
    /// Knowledge-base passages, highest score first.
    Retrieved(Vec<ScoredPassage>),
    None,
}

impl ContextBundle {
    pub fn kind(&self) -> ContextKind {
        match self {
            Self::Explicit(_) => ContextKind::Explicit,
            Self::Retrieved(_) => ContextKind::Retrieved,
            Self::None => ContextKind::None,
        }
    }

    /// Render the bundle as a prompt block under its provenance header.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Explicit(text) => Some(format!("{}\n{}", PROVIDED_CONTEXT_HEADER, text)),
            Self::Retrieved(passages) => {
                let mut block = String::from(KNOWLEDGE_CONTEXT_HEADER);
                block.push('\n');
                for (i, passage) in passages.iter().enumerate() {
                    block.push_str(&format!(
                        "--- Passage {} ({}, relevance {:.2}) ---\n{}\n\n",
                        i + 1,
                        passage.source,
                        passage.score,
                        passage.text
                    ));
                }
                Some(block.trim_end().to_string())
            }
            Self::None => None,
        }
    }
}

/// Picks the context for a turn.
///
/// Caller context always wins. Retrieval runs only when there is no caller
/// context, no image attachment, and the index is non-empty; only passages
/// scoring at least the threshold are kept. Index failures degrade to no
/// context.
#[derive(Clone)]
pub struct RetrievalRouter {
    index: Option<Arc<dyn VectorIndex>>,
    top_k: usize,
    threshold: f32,
}

impl Default for RetrievalRouter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RetrievalRouter {
    pub fn new(index: Option<Arc<dyn VectorIndex>>) -> Self {
        Self {
            index,
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Passages currently in the index, 0 when there is none.
    pub fn knowledge_base_size(&self) -> usize {
        self.index.as_ref().map_or(0, |index| index.len())
    }

    pub async fn resolve_context(
        &self,
        turn: &TurnRequest,
        knowledge_base_size: usize,
    ) -> ContextBundle {
        if let Some(context) = turn.explicit_context() {
            debug!("Using caller-supplied context ({} chars)", context.len());
            return ContextBundle::Explicit(context.to_string());
        }

        // Image turns are about the image, not the knowledge base
        if turn.has_image() {
            debug!("Image attached, skipping retrieval");
            return ContextBundle::None;
        }

        if knowledge_base_size == 0 || turn.text.trim().is_empty() {
            return ContextBundle::None;
        }

        let Some(index) = &self.index else {
            warn!("Knowledge base size is {} but no index is attached", knowledge_base_size);
            return ContextBundle::None;
        };

        let hits = match index.similarity_search(&turn.text, self.top_k).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Retrieval degraded, continuing without context: {}", e);
                return ContextBundle::None;
            }
        };

        let passages = filter_relevant(hits, self.threshold);
        if passages.is_empty() {
            debug!("No passage reached relevance threshold {}", self.threshold);
            return ContextBundle::None;
        }

        info!(
            passages = passages.len(),
            top_score = passages[0].score,
            "Retrieved knowledge base context"
        );
        ContextBundle::Retrieved(passages)
    }
}

/// Keep passages scoring at least `threshold`, highest first.
pub fn filter_relevant(hits: Vec<ScoredPassage>, threshold: f32) -> Vec<ScoredPassage> {
    let mut kept: Vec<ScoredPassage> = hits.into_iter().filter(|p| p.score >= threshold).collect();
    kept.sort_by(|a, b| b.score.total_cmp(&a.score));
    kept
}
