//! Prompt types for the Vetted CLI.

use serde::{Deserialize, Serialize};

/// A prompt definition, built-in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier (e.g., "grade.document")
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// System message template (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// User message template with Handlebars syntax
    pub template: String,
}

/// A fully rendered prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message
    pub user: String,
}
