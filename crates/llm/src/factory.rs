//! LLM provider factory.
//!
//! This module provides a factory for creating LLM clients based on
//! application configuration. It handles provider resolution and secret
//! checks.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use crate::types::ProviderType;
use std::sync::Arc;
use std::time::Duration;
use vetted_core::{AppError, AppResult};

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai", "claude")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (for providers that require it)
/// * `timeout` - Per-request timeout applied to every completion call
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown, not yet
/// implemented, or missing a required API key.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = OllamaClient::with_base_url(base_url, timeout);
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            if api_key.is_none() {
                return Err(AppError::Config(
                    "OpenAI provider requires API key".to_string(),
                ));
            }
            Err(AppError::Config(
                "OpenAI provider not yet implemented".to_string(),
            ))
        }
        ProviderType::Claude => {
            if api_key.is_none() {
                return Err(AppError::Config(
                    "Claude provider requires API key".to_string(),
                ));
            }
            Err(AppError::Config(
                "Claude provider not yet implemented".to_string(),
            ))
        }
    }
}
