//! Error types for the Vetted CLI.
//!
//! This module defines a unified error enum covering all error categories in
//! the application: configuration, I/O, LLM providers, external collaborators
//! (retrieval, judging, web search), prompts, and serialization.

use thiserror::Error;

/// Unified error type for the Vetted CLI.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
///
/// Note that exhausting a retry or fallback budget is *not* an error: the
/// workflow still delivers a result, flagged as degraded on the report
/// itself. Only genuine collaborator failures surface here.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// An external collaborator did not respond within its timeout
    #[error("Collaborator timeout: {0}")]
    CollaboratorTimeout(String),

    /// An external collaborator returned a malformed or unexpected response
    #[error("Collaborator error: {0}")]
    CollaboratorError(String),

    /// Prompt catalog errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
