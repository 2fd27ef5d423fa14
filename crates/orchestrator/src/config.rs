//! Orchestrator tuning parameters.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::dispatcher::RetryPolicy;
use crate::retrieval::{DEFAULT_RELEVANCE_THRESHOLD, DEFAULT_TOP_K};

/// Default web search result limit.
const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Default result limit in `DEEP_SEARCH` mode.
const DEFAULT_DEEP_SEARCH_LIMIT: usize = 10;

/// Default budget for extracted document text.
const DEFAULT_EXTRACTED_TEXT_MAX_CHARS: usize = 6000;

/// Configuration for the turn orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Minimum similarity for a knowledge-base passage to be used.
    pub relevance_threshold: f32,

    /// Passages fetched per retrieval.
    pub retrieval_top_k: usize,

    /// Extra primary attempts after a timeout or rate limit.
    pub max_retries: u32,

    /// Wait before the first retry; doubles each retry.
    pub backoff_base: Duration,

    /// Deadline for each primary call.
    pub primary_timeout: Duration,

    /// Web search results injected per turn.
    pub search_limit: usize,

    /// Web search results injected in `DEEP_SEARCH` mode.
    pub deep_search_limit: usize,

    /// Characters of extracted document text sent per attachment.
    pub extracted_text_max_chars: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            retrieval_top_k: DEFAULT_TOP_K,
            max_retries: retry.max_retries,
            backoff_base: retry.backoff_base,
            primary_timeout: retry.timeout,
            search_limit: DEFAULT_SEARCH_LIMIT,
            deep_search_limit: DEFAULT_DEEP_SEARCH_LIMIT,
            extracted_text_max_chars: DEFAULT_EXTRACTED_TEXT_MAX_CHARS,
        }
    }
}

impl OrchestratorConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables (unset or unparsable values keep the default):
    /// - `ASSISTANT_RELEVANCE_THRESHOLD` - Retrieval cutoff (default: 0.7)
    /// - `ASSISTANT_RETRIEVAL_TOP_K` - Passages per search (default: 4)
    /// - `ASSISTANT_MAX_RETRIES` - Primary retries (default: 2)
    /// - `ASSISTANT_BACKOFF_BASE_MS` - First retry delay (default: 2000)
    /// - `ASSISTANT_PRIMARY_TIMEOUT_SECS` - Primary call deadline (default: 60)
    /// - `ASSISTANT_SEARCH_LIMIT` - Web results per turn (default: 5)
    /// - `ASSISTANT_DEEP_SEARCH_LIMIT` - Web results in deep search (default: 10)
    /// - `ASSISTANT_EXTRACTED_TEXT_MAX_CHARS` - Extracted text budget (default: 6000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            relevance_threshold: parse_var("ASSISTANT_RELEVANCE_THRESHOLD")
                .filter(|t: &f32| (0.0..=1.0).contains(t))
                .unwrap_or(defaults.relevance_threshold),
            retrieval_top_k: parse_var("ASSISTANT_RETRIEVAL_TOP_K")
                .unwrap_or(defaults.retrieval_top_k),
            max_retries: parse_var("ASSISTANT_MAX_RETRIES").unwrap_or(defaults.max_retries),
            backoff_base: parse_var("ASSISTANT_BACKOFF_BASE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.backoff_base),
            primary_timeout: parse_var("ASSISTANT_PRIMARY_TIMEOUT_SECS")
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.primary_timeout),
            search_limit: parse_var("ASSISTANT_SEARCH_LIMIT").unwrap_or(defaults.search_limit),
            deep_search_limit: parse_var("ASSISTANT_DEEP_SEARCH_LIMIT")
                .unwrap_or(defaults.deep_search_limit),
            extracted_text_max_chars: parse_var("ASSISTANT_EXTRACTED_TEXT_MAX_CHARS")
                .unwrap_or(defaults.extracted_text_max_chars),
        }
    }

    pub fn with_relevance_threshold(mut self, threshold: f32) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    pub fn with_retrieval_top_k(mut self, top_k: usize) -> Self {
        self.retrieval_top_k = top_k;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff_base(mut self, backoff: Duration) -> Self {
        self.backoff_base = backoff;
        self
    }

    pub fn with_primary_timeout(mut self, timeout: Duration) -> Self {
        self.primary_timeout = timeout;
        self
    }

    pub fn with_search_limits(mut self, normal: usize, deep: usize) -> Self {
        self.search_limit = normal;
        self.deep_search_limit = deep;
        self
    }

    pub fn with_extracted_text_max_chars(mut self, max_chars: usize) -> Self {
        self.extracted_text_max_chars = max_chars;
        self
    }

    /// Retry policy for the provider dispatcher.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base: self.backoff_base,
            timeout: self.primary_timeout,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 8] = [
        "ASSISTANT_RELEVANCE_THRESHOLD",
        "ASSISTANT_RETRIEVAL_TOP_K",
        "ASSISTANT_MAX_RETRIES",
        "ASSISTANT_BACKOFF_BASE_MS",
        "ASSISTANT_PRIMARY_TIMEOUT_SECS",
        "ASSISTANT_SEARCH_LIMIT",
        "ASSISTANT_DEEP_SEARCH_LIMIT",
        "ASSISTANT_EXTRACTED_TEXT_MAX_CHARS",
    ];

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.relevance_threshold, 0.7);
        assert_eq!(config.retrieval_top_k, 4);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.backoff_base, Duration::from_secs(2));
        assert_eq!(config.primary_timeout, Duration::from_secs(60));
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_from_env_scenarios() {
        let _guard = ENV_LOCK.lock().unwrap();
        for var in VARS {
            env::remove_var(var);
        }

        assert_eq!(OrchestratorConfig::from_env(), OrchestratorConfig::default());

        env::set_var("ASSISTANT_RELEVANCE_THRESHOLD", "0.55");
        env::set_var("ASSISTANT_MAX_RETRIES", "4");
        env::set_var("ASSISTANT_BACKOFF_BASE_MS", "250");
        env::set_var("ASSISTANT_PRIMARY_TIMEOUT_SECS", "0");
        env::set_var("ASSISTANT_SEARCH_LIMIT", "not-a-number");
        let config = OrchestratorConfig::from_env();
        assert_eq!(config.relevance_threshold, 0.55);
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.backoff_base, Duration::from_millis(250));
        // Zero timeout and garbage keep their defaults
        assert_eq!(config.primary_timeout, Duration::from_secs(60));
        assert_eq!(config.search_limit, 5);

        env::set_var("ASSISTANT_RELEVANCE_THRESHOLD", "1.5");
        assert_eq!(OrchestratorConfig::from_env().relevance_threshold, 0.7);

        for var in VARS {
            env::remove_var(var);
        }
    }
}
