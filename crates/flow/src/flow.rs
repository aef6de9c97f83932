//! The workflow orchestrator.
//!
//! An explicit state machine drives one question from retrieval to a
//! quality-gated answer. Routing is decided by typed verdicts, and every
//! cycle back to generation is gated by the attempts counter or the
//! one-shot web fallback flag; both are monotone, so the loop always
//! reaches its terminal state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use vetted_core::{AppError, AppResult};

use crate::collaborators::{Generator, Judge, Retriever, WebSearch};
use crate::grade;
use crate::state::{
    JudgmentSubject, JudgmentTarget, PassageId, PassageOrigin, RunReport, RunState,
};

/// Bounds applied to one run.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// How many passages to request from the index
    pub top_k: usize,

    /// Total answer generations allowed per run, retries and the
    /// post-fallback generation included
    pub max_generation_attempts: u32,

    /// Timeout applied to every collaborator call
    pub collaborator_timeout: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            max_generation_attempts: 3,
            collaborator_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&vetted_core::config::FlowSettings> for FlowConfig {
    fn from(settings: &vetted_core::config::FlowSettings) -> Self {
        Self {
            top_k: settings.top_k,
            max_generation_attempts: settings.max_generation_attempts,
            collaborator_timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Named states of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Retrieve,
    GradeDocs,
    WebSearch,
    Generate,
    GradeGroundedness,
    GradeRelevance,
    Done,
}

/// The question-answering workflow.
///
/// One `Workflow` is cheap to share across concurrent questions: each call
/// to [`Workflow::answer`] owns its entire run state, so runs need no
/// coordination. Dropping the returned future cancels every in-flight
/// collaborator call for that run and no other.
pub struct Workflow {
    retriever: Arc<dyn Retriever>,
    judge: Arc<dyn Judge>,
    generator: Arc<dyn Generator>,
    web_search: Arc<dyn WebSearch>,
    config: FlowConfig,
}

impl Workflow {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        judge: Arc<dyn Judge>,
        generator: Arc<dyn Generator>,
        web_search: Arc<dyn WebSearch>,
        config: FlowConfig,
    ) -> Self {
        Self {
            retriever,
            judge,
            generator,
            web_search,
            config,
        }
    }

    /// Answer a question, returning the final answer plus the evaluation
    /// trail.
    ///
    /// Grading failures are absorbed fail-closed and web search failures
    /// become an empty passage set; only a twice-failed generation aborts
    /// the run. Exhausted budgets still deliver a result, flagged as
    /// degraded on the report.
    pub async fn answer(&self, question: &str) -> AppResult<RunReport> {
        tracing::info!("Answering question: {}", question);

        let mut run = RunState::new(question);
        let mut step = Step::Retrieve;

        while step != Step::Done {
            tracing::debug!("Workflow step: {:?}", step);

            step = match step {
                Step::Retrieve => self.retrieve(&mut run).await?,
                Step::GradeDocs => self.grade_docs(&mut run).await?,
                Step::WebSearch => self.search_web(&mut run).await?,
                Step::Generate => self.generate(&mut run).await?,
                Step::GradeGroundedness => self.grade_groundedness(&mut run).await?,
                Step::GradeRelevance => self.grade_relevance(&mut run).await?,
                Step::Done => Step::Done,
            };
        }

        let report = run
            .finish()
            .ok_or_else(|| AppError::Other("Workflow terminated without an answer".to_string()))?;

        tracing::info!(
            "Run finished: web_search={}, degraded={}, {} judgments",
            report.used_web_search,
            report.is_degraded(),
            report.evaluation_trail.len()
        );

        Ok(report)
    }

    /// Obtain top-k passages from the index.
    ///
    /// A failing or empty index is not fatal: the run degrades to web
    /// search, skipping document grading entirely.
    async fn retrieve(&self, run: &mut RunState) -> AppResult<Step> {
        let results = match self
            .bounded(
                "retrieval",
                self.retriever.retrieve(run.question(), self.config.top_k),
            )
            .await
        {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Retrieval failed, falling back to web search: {}", e);
                Vec::new()
            }
        };

        if results.is_empty() {
            tracing::info!("Index returned no passages");
            return Ok(Step::WebSearch);
        }

        tracing::info!("Retrieved {} passages", results.len());
        run.set_passages(results, PassageOrigin::Document);
        Ok(Step::GradeDocs)
    }

    /// Grade every retrieved passage for relevance and keep the ones that
    /// pass.
    ///
    /// Passages are independent, so grading fans out concurrently; the
    /// keep-if-true filter is commutative, so no ordering is needed across
    /// the judgments. A failed grading call fails closed: the passage is
    /// treated as not relevant.
    async fn grade_docs(&self, run: &mut RunState) -> AppResult<Step> {
        let question = run.question();

        let verdict_futures = run.passages().iter().map(|passage| async move {
            let verdict = match self
                .bounded(
                    "document grading",
                    grade::grade_document_relevance(self.judge.as_ref(), question, passage),
                )
                .await
            {
                Ok(verdict) => verdict,
                Err(e) => {
                    tracing::warn!(
                        "Relevance grading failed for {:?}, treating as not relevant: {}",
                        passage.id,
                        e
                    );
                    false
                }
            };
            (passage.id, verdict)
        });

        let verdicts: Vec<(PassageId, bool)> = join_all(verdict_futures).await;

        for (id, verdict) in &verdicts {
            run.record_judgment(
                JudgmentSubject::DocumentRelevance,
                JudgmentTarget::Passage(*id),
                *verdict,
            );
        }

        let keep: Vec<PassageId> = verdicts
            .iter()
            .filter(|(_, verdict)| *verdict)
            .map(|(id, _)| *id)
            .collect();

        if keep.is_empty() {
            tracing::info!("No retrieved passage judged relevant");
            return Ok(Step::WebSearch);
        }

        tracing::info!("{} of {} passages judged relevant", keep.len(), verdicts.len());
        run.retain_passages(&keep);
        Ok(Step::Generate)
    }

    /// Invoke the web search fallback, at most once per run.
    ///
    /// A second escalation request routes straight to Done with the best
    /// answer produced so far. A failing search collaborator becomes an
    /// empty passage set, never a failed run.
    async fn search_web(&self, run: &mut RunState) -> AppResult<Step> {
        if run.web_fallback_used() {
            tracing::info!("Web fallback already spent, delivering best answer so far");
            return Ok(Step::Done);
        }

        run.mark_web_fallback_used();

        let results = match self
            .bounded("web search", self.web_search.search(run.question()))
            .await
        {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Web search failed, continuing without passages: {}", e);
                Vec::new()
            }
        };

        tracing::info!("Web search produced {} passages", results.len());
        run.set_passages(results, PassageOrigin::Web);
        Ok(Step::Generate)
    }

    /// Generate an answer from the current passage set.
    ///
    /// A generation-service error is retried once with unchanged inputs; a
    /// second consecutive failure is fatal to the run. When the attempts
    /// budget is already spent (reachable after a groundedness escalation)
    /// the run delivers the best answer so far instead of generating.
    async fn generate(&self, run: &mut RunState) -> AppResult<Step> {
        if run.generation_attempts() >= self.config.max_generation_attempts {
            tracing::info!("Generation budget exhausted, delivering best answer so far");
            return Ok(Step::Done);
        }

        run.count_generation_attempt();
        tracing::info!(
            "Generating answer (attempt {}/{}, {} passages)",
            run.generation_attempts(),
            self.config.max_generation_attempts,
            run.passages().len()
        );

        let text = {
            let question = run.question();
            let passages = run.passages();

            match self
                .bounded("generation", self.generator.generate(question, passages))
                .await
            {
                Ok(text) => text,
                Err(first) => {
                    tracing::warn!("Generation failed, retrying once: {}", first);
                    self.bounded("generation", self.generator.generate(question, passages))
                        .await
                        .map_err(|second| {
                            AppError::CollaboratorError(format!(
                                "Generation failed twice: {}; first failure: {}",
                                second, first
                            ))
                        })?
                }
            }
        };

        run.push_answer(text);
        Ok(Step::GradeGroundedness)
    }

    /// Gate the latest answer on groundedness.
    async fn grade_groundedness(&self, run: &mut RunState) -> AppResult<Step> {
        let answer = run
            .latest_answer()
            .cloned()
            .ok_or_else(|| AppError::Other("No answer to grade".to_string()))?;

        let verdict = match self
            .bounded(
                "groundedness grading",
                grade::grade_groundedness(self.judge.as_ref(), run.question(), &answer),
            )
            .await
        {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!("Groundedness grading failed, treating as unsupported: {}", e);
                false
            }
        };

        run.record_judgment(
            JudgmentSubject::Groundedness,
            JudgmentTarget::Answer(answer.id),
            verdict,
        );

        if verdict {
            return Ok(Step::GradeRelevance);
        }

        // No evidence and fallback spent: groundedness cannot improve, the
        // gate is moot and the answer proceeds to the relevance check.
        if answer.supporting.is_empty() && run.web_fallback_used() {
            tracing::info!("No evidence available, skipping groundedness retries");
            return Ok(Step::GradeRelevance);
        }

        if run.generation_attempts() < self.config.max_generation_attempts {
            tracing::info!("Answer not grounded, retrying generation");
            return Ok(Step::Generate);
        }

        if !run.web_fallback_used() {
            tracing::info!("Answer not grounded and retries spent, escalating to web search");
            return Ok(Step::WebSearch);
        }

        tracing::info!("Answer not grounded and budgets spent, delivering degraded answer");
        Ok(Step::Done)
    }

    /// Gate the latest answer on question-relevance.
    async fn grade_relevance(&self, run: &mut RunState) -> AppResult<Step> {
        let answer = run
            .latest_answer()
            .cloned()
            .ok_or_else(|| AppError::Other("No answer to grade".to_string()))?;

        let verdict = match self
            .bounded(
                "relevance grading",
                grade::grade_answer_relevance(self.judge.as_ref(), run.question(), &answer),
            )
            .await
        {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!("Relevance grading failed, treating as off-target: {}", e);
                false
            }
        };

        run.record_judgment(
            JudgmentSubject::AnswerRelevance,
            JudgmentTarget::Answer(answer.id),
            verdict,
        );

        if verdict {
            return Ok(Step::Done);
        }

        if !run.web_fallback_used() {
            tracing::info!("Answer off-target, escalating to web search");
            return Ok(Step::WebSearch);
        }

        tracing::info!("Answer off-target and fallback spent, delivering degraded answer");
        Ok(Step::Done)
    }

    /// Apply the configured timeout to one collaborator call.
    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.config.collaborator_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::CollaboratorTimeout(format!(
                "{} exceeded {:?}",
                operation, self.config.collaborator_timeout
            ))),
        }
    }
}
