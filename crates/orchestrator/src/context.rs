//! Context builder for the user message sent to the provider.

use agent_tools::SearchHit;

use crate::retrieval::ContextBundle;

/// Header for web search results.
pub const SEARCH_RESULTS_HEADER: &str = "[WEB SEARCH RESULTS]";

/// Header for notes about side effects already performed this turn.
pub const TURN_NOTES_HEADER: &str = "[TURN NOTES]";

/// Header that introduces the user's own text once context is prepended.
pub const USER_MESSAGE_HEADER: &str = "[USER MESSAGE]";

/// Context accumulated before generation.
///
/// Search results, the resolved context bundle and turn notes are prepended
/// to the user's text, each under its own header.
#[derive(Debug, Clone, Default)]
pub struct Context {
    search: Option<(String, Vec<SearchHit>)>,
    bundle: Option<String>,
    notes: Vec<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record web search results for `query`. Empty results are ignored.
    pub fn add_search_results(&mut self, query: &str, hits: Vec<SearchHit>) {
        if !hits.is_empty() {
            self.search = Some((query.to_string(), hits));
        }
    }

    /// Record the turn's context bundle.
    pub fn set_bundle(&mut self, bundle: &ContextBundle) {
        self.bundle = bundle.render();
    }

    /// Add a note the model should know about (e.g. a reminder was saved).
    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn has_search_results(&self) -> bool {
        self.search.is_some()
    }

    pub fn search_result_count(&self) -> usize {
        self.search.as_ref().map_or(0, |(_, hits)| hits.len())
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.bundle.is_none() && self.notes.is_empty()
    }

    /// The user text with all gathered context prepended.
    ///
    /// Returns `original` unchanged when nothing was gathered.
    pub fn augment_message(&self, original: &str) -> String {
        if self.is_empty() {
            return original.to_string();
        }

        let mut text = String::new();

        if let Some((query, hits)) = &self.search {
            text.push_str(&format!("{}\nQuery: {}\n", SEARCH_RESULTS_HEADER, query));
            for (i, hit) in hits.iter().enumerate() {
                text.push_str(&format!(
                    "--- Result {}: {} ---\n{}\nSource: {}\n\n",
                    i + 1,
                    hit.title,
                    hit.snippet,
                    hit.url
                ));
            }
        }

        if let Some(bundle) = &self.bundle {
            text.push_str(bundle);
            text.push_str("\n\n");
        }

        if !self.notes.is_empty() {
            text.push_str(TURN_NOTES_HEADER);
            text.push('\n');
            for note in &self.notes {
                text.push_str(&format!("- {}\n", note));
            }
            text.push('\n');
        }

        text.push_str(USER_MESSAGE_HEADER);
        text.push('\n');
        text.push_str(original);
        text
    }
}
