//! LLM integration crate for the Vetted CLI.
//!
//! This crate provides a provider-agnostic abstraction for the two language
//! model roles the answer workflow consumes: answer generation and binary
//! quality judging. Both go through the same completion interface.
//!
//! There is deliberately no streaming surface: every answer passes the
//! grading gates before it is shown, so a token stream would have no
//! consumer.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - Future: OpenAI, Claude
//!
//! # Example
//! ```no_run
//! use vetted_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new(Duration::from_secs(30));
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::OllamaClient;
pub use types::ProviderType;
