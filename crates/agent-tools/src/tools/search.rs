//! Web search adapter.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{authorize, check_status, http_client, DEFAULT_TIMEOUT};
use crate::error::ToolError;
use crate::tool::{SearchHit, WebSearch};

/// Maximum snippet length kept per hit.
const MAX_SNIPPET_LENGTH: usize = 500;

/// Web search over HTTP: `GET <endpoint>?q=<query>&count=<limit>`.
///
/// The response must carry a `results` (or `items`) array of objects with
/// `title`, `url` (or `link`) and `snippet` (or `description`/`content`).
/// Snippets containing markup are flattened to plain text.
pub struct HttpWebSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default, alias = "items")]
    results: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(default)]
    title: String,
    #[serde(default, alias = "link")]
    url: String,
    #[serde(default, alias = "description", alias = "content")]
    snippet: String,
}

impl HttpWebSearch {
    /// Create a new search adapter for the given endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self, ToolError> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint).map_err(|e| ToolError::invalid("endpoint", e.to_string()))?;
        Ok(Self {
            client: http_client(DEFAULT_TIMEOUT)?,
            endpoint,
            api_key,
        })
    }
}

/// Flatten HTML to text; plain strings pass through.
pub(crate) fn flatten_html(snippet: &str) -> String {
    let flattened = if snippet.contains('<') {
        match html2text::from_read(snippet.as_bytes(), 10_000) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to flatten snippet HTML: {}", e);
                snippet.to_string()
            }
        }
    } else {
        snippet.to_string()
    };
    let collapsed = flattened.split_whitespace().collect::<Vec<_>>().join(" ");
    super::truncate_utf8(&collapsed, MAX_SNIPPET_LENGTH)
}

fn into_hits(response: SearchResponse, limit: usize) -> Vec<SearchHit> {
    response
        .results
        .into_iter()
        .filter(|hit| !hit.url.trim().is_empty() || !hit.snippet.trim().is_empty())
        .take(limit)
        .map(|hit| SearchHit {
            title: flatten_html(&hit.title),
            url: hit.url.trim().to_string(),
            snippet: flatten_html(&hit.snippet),
        })
        .collect()
}

#[async_trait]
impl WebSearch for HttpWebSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::invalid("query", "query is empty"));
        }

        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| ToolError::invalid("endpoint", e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("count", &limit.to_string());

        debug!("Web search: {} (limit {})", query, limit);

        let request = self.client.get(url);
        let response = authorize(request, self.api_key.as_deref()).send().await?;
        let response = check_status(response).await?;

        let body: SearchResponse = response.json().await?;
        Ok(into_hits(body, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_html() {
        assert_eq!(flatten_html("plain   text\nhere"), "plain text here");
        let flattened = flatten_html("<b>Bold</b> and <i>italic</i>");
        assert!(flattened.contains("Bold"));
        assert!(!flattened.contains("<b>"));
    }

    #[test]
    fn test_into_hits_aliases_and_limit() {
        let json = r#"{
            "items": [
                {"title": "One", "link": "https://one.example", "description": "first"},
                {"title": "Two", "url": "https://two.example", "content": "second"},
                {"title": "Three", "url": "https://three.example", "snippet": "third"}
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let hits = into_hits(response, 2);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://one.example");
        assert_eq!(hits[0].snippet, "first");
        assert_eq!(hits[1].snippet, "second");
    }

    #[test]
    fn test_empty_results() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(into_hits(response, 5).is_empty());
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(HttpWebSearch::new("not a url", None).is_err());
    }
}
