//! Tavily web search adapter.
//!
//! Tavily API: https://docs.tavily.com/docs/rest-api/api-reference
//!
//! Results keep the service's own ranking; no local re-ranking happens
//! anywhere in the workflow.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vetted_core::{AppError, AppResult};

use crate::collaborators::{RetrievedText, WebSearch};

const DEFAULT_ENDPOINT: &str = "https://api.tavily.com";

/// How many results to request per search.
const MAX_RESULTS: usize = 5;

/// Tavily API request format.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

/// Tavily API response format.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    url: String,
    content: String,
}

/// Tavily web search client.
pub struct TavilyClient {
    api_key: String,
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT, timeout)
    }

    /// Create a client against a custom endpoint (tests, proxies).
    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::CollaboratorTimeout(format!(
                "Web search did not respond within {:?}",
                self.timeout
            ))
        } else {
            AppError::CollaboratorError(format!("Failed to reach web search: {}", err))
        }
    }
}

#[async_trait::async_trait]
impl WebSearch for TavilyClient {
    async fn search(&self, question: &str) -> AppResult<Vec<RetrievedText>> {
        tracing::debug!("Web search for: {}", question);

        let url = format!("{}/search", self.endpoint);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&SearchRequest {
                api_key: &self.api_key,
                query: question,
                max_results: MAX_RESULTS,
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::CollaboratorError(format!(
                "Web search error ({}): {}",
                status, error_text
            )));
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            AppError::CollaboratorError(format!("Malformed web search response: {}", e))
        })?;

        tracing::debug!("Web search returned {} results", parsed.results.len());

        Ok(parsed
            .results
            .into_iter()
            .map(|result| RetrievedText {
                text: result.content,
                source: result.url,
            })
            .collect())
    }
}
