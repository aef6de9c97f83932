//! HTTP adapter for the document index collaborator.
//!
//! The index is an external service with a narrow contract: POST a query
//! and a bound, get back ranked `{text, source}` pairs. Zero results is a
//! normal response, not an error.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vetted_core::{AppError, AppResult};

use crate::collaborators::{RetrievedText, Retriever};

/// Index API request format.
#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    query: &'a str,
    k: usize,
}

/// Index API response format.
#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    results: Vec<RetrievedText>,
}

/// Document index client.
pub struct HttpRetriever {
    /// Base URL of the index service
    endpoint: String,

    /// Per-request timeout
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpRetriever {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::CollaboratorTimeout(format!(
                "Index did not respond within {:?}",
                self.timeout
            ))
        } else {
            AppError::CollaboratorError(format!("Failed to reach index: {}", err))
        }
    }
}

#[async_trait::async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, question: &str, k: usize) -> AppResult<Vec<RetrievedText>> {
        tracing::debug!("Retrieving top-{} passages for: {}", k, question);

        let url = format!("{}/retrieve", self.endpoint);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&RetrieveRequest { query: question, k })
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
                "Index error ({}): {}",
                status, error_text
            )));
        }

        let parsed: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| AppError::CollaboratorError(format!("Malformed index response: {}", e)))?;

        tracing::debug!("Index returned {} passages", parsed.results.len());

        Ok(parsed.results)
    }
}
