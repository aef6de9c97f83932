//! LLM-backed judge and generator.
//!
//! Both adapters render a catalog prompt and send it through the shared
//! completion client. The judge demands a strict yes/no token back; any
//! other content is a malformed collaborator response, not a silent
//! verdict.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use vetted_core::{AppError, AppResult};
use vetted_llm::{LlmClient, LlmRequest};
use vetted_prompt::{catalog, load_prompt, render_prompt};

use crate::collaborators::{Generator, Judge, JudgeKind, JudgeRequest};
use crate::grade::join_passages;
use crate::state::Passage;

/// Sampling temperature for grading calls. Verdicts should be as
/// deterministic as the model allows.
const JUDGE_TEMPERATURE: f32 = 0.0;

/// Verdicts are a single token; anything longer is already malformed.
const JUDGE_MAX_TOKENS: u32 = 8;

/// Sampling temperature for answer generation (factual, low variance).
const GENERATE_TEMPERATURE: f32 = 0.3;

/// Cap on generated answer length.
const GENERATE_MAX_TOKENS: u32 = 1000;

/// Judgment service backed by an LLM completion client.
pub struct LlmJudge {
    client: Arc<dyn LlmClient>,
    model: String,
    workspace: PathBuf,
}

impl LlmJudge {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            workspace: workspace.into(),
        }
    }

    fn prompt_id(kind: JudgeKind) -> &'static str {
        match kind {
            JudgeKind::DocumentRelevance => catalog::GRADE_DOCUMENT,
            JudgeKind::Groundedness => catalog::GRADE_GROUNDEDNESS,
            JudgeKind::AnswerRelevance => catalog::GRADE_RELEVANCE,
        }
    }

    /// Parse a strict yes/no verdict out of the model response.
    fn parse_verdict(content: &str) -> AppResult<bool> {
        let token: String = content
            .split_whitespace()
            .next()
            .unwrap_or("")
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_lowercase();

        match token.as_str() {
            "yes" => Ok(true),
            "no" => Ok(false),
            _ => Err(AppError::CollaboratorError(format!(
                "Judge returned neither yes nor no: {:?}",
                content
            ))),
        }
    }
}

#[async_trait::async_trait]
impl Judge for LlmJudge {
    async fn judge(&self, kind: JudgeKind, request: JudgeRequest<'_>) -> AppResult<bool> {
        let definition = load_prompt(&self.workspace, Self::prompt_id(kind))?;

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), request.question.to_string());

        match kind {
            JudgeKind::DocumentRelevance => {
                let passage = request.passage.ok_or_else(|| {
                    AppError::Other("Document relevance judgment without a passage".to_string())
                })?;
                variables.insert("passage".to_string(), passage.to_string());
            }
            JudgeKind::Groundedness => {
                let passages = request.passage.ok_or_else(|| {
                    AppError::Other("Groundedness judgment without passages".to_string())
                })?;
                let answer = request.answer.ok_or_else(|| {
                    AppError::Other("Groundedness judgment without an answer".to_string())
                })?;
                variables.insert("passages".to_string(), passages.to_string());
                variables.insert("answer".to_string(), answer.to_string());
            }
            JudgeKind::AnswerRelevance => {
                let answer = request.answer.ok_or_else(|| {
                    AppError::Other("Answer relevance judgment without an answer".to_string())
                })?;
                variables.insert("answer".to_string(), answer.to_string());
            }
        }

        let rendered = render_prompt(&definition, &variables)?;

        let mut llm_request = LlmRequest::new(rendered.user, self.model.as_str())
            .with_temperature(JUDGE_TEMPERATURE)
            .with_max_tokens(JUDGE_MAX_TOKENS);
        if let Some(system) = rendered.system {
            llm_request = llm_request.with_system(system);
        }

        let response = self.client.complete(&llm_request).await?;

        Self::parse_verdict(&response.content)
    }
}

/// Answer generator backed by an LLM completion client.
pub struct LlmGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    workspace: PathBuf,
}

impl LlmGenerator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            workspace: workspace.into(),
        }
    }
}

#[async_trait::async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, question: &str, passages: &[Passage]) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());

        let prompt_id = if passages.is_empty() {
            catalog::GENERATE_ANSWER_NOCONTEXT
        } else {
            variables.insert("context".to_string(), join_passages(passages));
            catalog::GENERATE_ANSWER
        };

        let definition = load_prompt(&self.workspace, prompt_id)?;
        let rendered = render_prompt(&definition, &variables)?;

        let mut llm_request = LlmRequest::new(rendered.user, self.model.as_str())
            .with_temperature(GENERATE_TEMPERATURE)
            .with_max_tokens(GENERATE_MAX_TOKENS);
        if let Some(system) = rendered.system {
            llm_request = llm_request.with_system(system);
        }

        let response = self.client.complete(&llm_request).await?;

        Ok(response.content.trim().to_string())
    }
}
