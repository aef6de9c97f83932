//! Ask command handler.
//!
//! Wires the configured collaborators into the answer workflow, runs one
//! question through it, and renders the answer, its sources and the
//! evaluation trail.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use vetted_core::{config::AppConfig, AppError, AppResult};
use vetted_flow::adapters::{HttpRetriever, LlmGenerator, LlmJudge, TavilyClient};
use vetted_flow::{
    FlowConfig, JudgmentSubject, JudgmentTarget, PassageOrigin, RunReport, Workflow,
};
use vetted_llm::create_client;

/// Ask a question and get a quality-gated answer
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// How many passages to request from the index
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Maximum answer generations for this run
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Show the full evaluation trail under the answer
    #[arg(long)]
    pub show_trail: bool,

    /// Output the full report as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self
            .get_question()?
            .ok_or_else(|| AppError::Config("No question provided".to_string()))?;

        config.validate()?;

        // Apply per-invocation bound overrides
        let mut settings = config.flow.clone();
        if let Some(top_k) = self.top_k {
            settings.top_k = top_k;
        }
        if let Some(max_attempts) = self.max_attempts {
            settings.max_generation_attempts = max_attempts;
        }
        let flow_config = FlowConfig::from(&settings);
        let timeout = flow_config.collaborator_timeout;

        // Build the collaborators
        let llm = create_client(
            &config.provider,
            config.llm_endpoint.as_deref(),
            config.api_key.as_deref(),
            timeout,
        )?;

        let judge = Arc::new(LlmJudge::new(
            llm.clone(),
            config.model.as_str(),
            config.workspace.clone(),
        ));
        let generator = Arc::new(LlmGenerator::new(
            llm,
            config.model.as_str(),
            config.workspace.clone(),
        ));
        let retriever = Arc::new(HttpRetriever::new(
            config.retriever_endpoint.as_str(),
            timeout,
        ));

        let search_api_key = config.search_api_key.clone().ok_or_else(|| {
            AppError::Config(
                "Web search API key not configured. Set TAVILY_API_KEY or search.apiKeyEnv."
                    .to_string(),
            )
        })?;
        let search = Arc::new(TavilyClient::new(search_api_key, timeout));

        let workflow = Workflow::new(retriever, judge, generator, search, flow_config);

        let report = workflow.answer(&question).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        print!("{}", render_report(&report, self.show_trail));
        Ok(())
    }

    /// Resolve the question from the positional argument or a file.
    fn get_question(&self) -> AppResult<Option<String>> {
        if let Some(ref question) = self.question {
            return Ok(Some(question.clone()));
        }

        if let Some(ref path) = self.file {
            let contents = std::fs::read_to_string(path)?;
            let trimmed = contents.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            return Ok(Some(trimmed.to_string()));
        }

        Ok(None)
    }
}

/// Render the report for terminal output.
fn render_report(report: &RunReport, show_trail: bool) -> String {
    let mut out = String::new();

    out.push_str(&report.answer.text);
    out.push('\n');

    if let Some(degradation) = report.degradation {
        out.push('\n');
        out.push_str(&format!("Note: {}\n", degradation_notice(degradation)));
    }

    if !report.answer.supporting.is_empty() {
        out.push_str("\nSources:\n");
        for passage in &report.answer.supporting {
            out.push_str(&format!(
                "  [{}] {}\n",
                origin_tag(passage.origin),
                passage.source
            ));
        }
    }

    if show_trail {
        out.push_str("\nEvaluation trail:\n");
        for judgment in &report.evaluation_trail {
            out.push_str(&format!("  {}\n", trail_line(judgment)));
        }
    }

    out
}

fn degradation_notice(degradation: vetted_flow::Degradation) -> &'static str {
    match degradation {
        vetted_flow::Degradation::Unsupported => {
            "this answer could not be verified against any source and may be unsupported."
        }
        vetted_flow::Degradation::OffTarget => {
            "this answer may not address the question directly."
        }
    }
}

fn origin_tag(origin: PassageOrigin) -> &'static str {
    match origin {
        PassageOrigin::Document => "doc",
        PassageOrigin::Web => "web",
    }
}

fn trail_line(judgment: &vetted_flow::Judgment) -> String {
    let subject = match judgment.subject {
        JudgmentSubject::DocumentRelevance => "document relevance",
        JudgmentSubject::Groundedness => "groundedness",
        JudgmentSubject::AnswerRelevance => "answer relevance",
    };

    let target = match judgment.target {
        JudgmentTarget::Passage(id) => format!("passage {}", id.0),
        JudgmentTarget::Answer(id) => format!("answer {}", id.0),
    };

    let verdict = if judgment.verdict { "pass" } else { "fail" };

    format!("{:<20} {:<12} {}", subject, target, verdict)
}
