//! Built-in prompt definitions and workspace overrides.
//!
//! Every prompt the workflow uses has a built-in definition so the binary
//! works without a seeded workspace. A YAML file at
//! `.vetted/prompts/<id>.yml` replaces the built-in wholesale.

use crate::types::PromptDefinition;
use std::path::Path;
use vetted_core::{AppError, AppResult};

/// Grading prompt: is one retrieved passage relevant to the question?
pub const GRADE_DOCUMENT: &str = "grade.document";

/// Grading prompt: is the answer fully supported by its passages?
pub const GRADE_GROUNDEDNESS: &str = "grade.groundedness";

/// Grading prompt: does the answer address the question asked?
pub const GRADE_RELEVANCE: &str = "grade.relevance";

/// Generation prompt: answer from supporting passages.
pub const GENERATE_ANSWER: &str = "generate.answer";

/// Generation prompt: answer with no supporting passages available.
pub const GENERATE_ANSWER_NOCONTEXT: &str = "generate.answer.nocontext";

/// A catalog entry as shown by `vetted prompts`.
#[derive(Debug, Clone)]
pub struct PromptEntry {
    pub id: String,
    pub title: String,
    /// Whether the workspace overrides the built-in definition
    pub overridden: bool,
}

/// All built-in prompt ids, in display order.
pub fn builtin_ids() -> &'static [&'static str] {
    &[
        GRADE_DOCUMENT,
        GRADE_GROUNDEDNESS,
        GRADE_RELEVANCE,
        GENERATE_ANSWER,
        GENERATE_ANSWER_NOCONTEXT,
    ]
}

/// Get the built-in definition for a prompt id.
fn builtin(id: &str) -> Option<PromptDefinition> {
    let (title, system, template) = match id {
        GRADE_DOCUMENT => (
            "Document relevance grader",
            "You are a grader assessing whether a retrieved passage is relevant \
             to a user question. Relevance means the passage contains keywords or \
             meaning related to the question. Answer with a single word: yes or no.",
            "Passage:\n{{passage}}\n\nQuestion: {{question}}\n\n\
             Is the passage relevant to the question? Answer yes or no.",
        ),
        GRADE_GROUNDEDNESS => (
            "Groundedness grader",
            "You are a grader assessing whether an answer is fully supported by a \
             set of passages. If any material claim in the answer is not traceable \
             to the passages, the answer is not supported. Answer with a single \
             word: yes or no.",
            "Passages:\n{{passages}}\n\nAnswer:\n{{answer}}\n\n\
             Is every material claim in the answer supported by the passages? \
             Answer yes or no.",
        ),
        GRADE_RELEVANCE => (
            "Answer relevance grader",
            "You are a grader assessing whether an answer addresses the specific \
             question asked, not merely the same topic. Answer with a single \
             word: yes or no.",
            "Question: {{question}}\n\nAnswer:\n{{answer}}\n\n\
             Does the answer address the specific question asked? Answer yes or no.",
        ),
        GENERATE_ANSWER => (
            "Grounded answer generator",
            "You are an assistant answering questions from provided context. Use \
             only the context to answer. Keep the answer concise and factual. If \
             the context does not contain the answer, say so.",
            "Context:\n{{context}}\n\nQuestion: {{question}}\n\nAnswer:",
        ),
        GENERATE_ANSWER_NOCONTEXT => (
            "Unsupported answer generator",
            "You are an assistant answering a question without any supporting \
             documents. Answer from general knowledge, keep it brief, and state \
             clearly when you are unsure.",
            "Question: {{question}}\n\nAnswer:",
        ),
        _ => return None,
    };

    Some(PromptDefinition {
        id: id.to_string(),
        title: title.to_string(),
        system: Some(system.to_string()),
        template: template.to_string(),
    })
}

/// Load a prompt definition by id.
///
/// A workspace override at `.vetted/prompts/<id>.yml` wins over the
/// built-in; an absent file falls back silently. An id with neither an
/// override nor a built-in is an error.
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(".vetted/prompts")
        .join(format!("{}.yml", prompt_id));

    if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to parse prompt YAML {:?}: {}",
                prompt_file, e
            ))
        })?;

        validate_prompt(&definition)?;

        tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    builtin(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt id: {}", prompt_id)))
}

/// List the catalog: built-in prompts plus any workspace overrides.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<PromptEntry>> {
    let overrides = override_ids(workspace_path);

    let mut entries = Vec::new();
    for id in builtin_ids() {
        let definition = load_prompt(workspace_path, id)?;
        entries.push(PromptEntry {
            id: definition.id,
            title: definition.title,
            overridden: overrides.contains(&id.to_string()),
        });
    }

    Ok(entries)
}

/// Collect the ids of override files present in the workspace.
fn override_ids(workspace_path: &Path) -> Vec<String> {
    let prompts_dir = workspace_path.join(".vetted/prompts");

    if !prompts_dir.exists() {
        return Vec::new();
    }

    let mut ids = Vec::new();
    for entry in walkdir::WalkDir::new(&prompts_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let name = entry.file_name().to_string_lossy();
        if let Some(id) = name.strip_suffix(".yml") {
            ids.push(id.to_string());
        }
    }

    ids
}

/// Validate required fields of an override definition.
fn validate_prompt(definition: &PromptDefinition) -> AppResult<()> {
    if definition.id.is_empty() {
        return Err(AppError::Prompt("Prompt id must not be empty".to_string()));
    }

    if definition.template.is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' has an empty template",
            definition.id
        )));
    }

    Ok(())
}
