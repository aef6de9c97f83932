//! Collaborator interfaces consumed by the workflow.
//!
//! Each external service sits behind one narrow async trait so the
//! workflow's routing decisions are deterministic under test. Contracts:
//!
//! - [`Retriever`] is bounded by `k`, may return fewer or zero results and
//!   must not error on "no results".
//! - [`Judge`] failures must be distinguishable errors, never a silent
//!   false; the workflow decides how to absorb them.
//! - [`Generator`] returns text only; the workflow attaches the supporting
//!   passages itself (traceability requirement).
//! - [`WebSearch`] results are ranked by the service; no local re-ranking.

use serde::{Deserialize, Serialize};
use vetted_core::AppResult;

use crate::state::Passage;

/// A unit of text returned by retrieval or web search, before the workflow
/// assigns provenance and a run-local id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedText {
    pub text: String,
    pub source: String,
}

/// The document index collaborator.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve up to `k` passages matching the question.
    async fn retrieve(&self, question: &str, k: usize) -> AppResult<Vec<RetrievedText>>;
}

/// Which binary quality question the judge is being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JudgeKind {
    /// Is one retrieved passage relevant to the question?
    DocumentRelevance,
    /// Is the answer fully supported by its passages?
    Groundedness,
    /// Does the answer address the specific question asked?
    AnswerRelevance,
}

/// Payload for one judgment call.
///
/// Which fields are set depends on the kind: document relevance carries
/// the passage, groundedness carries the joined passages and the answer,
/// answer relevance carries the answer alone (plus the question).
#[derive(Debug, Clone, Copy)]
pub struct JudgeRequest<'a> {
    pub question: &'a str,
    pub passage: Option<&'a str>,
    pub answer: Option<&'a str>,
}

/// The judgment service shared by all three graders.
#[async_trait::async_trait]
pub trait Judge: Send + Sync {
    /// Return a binary verdict for the given kind and payload.
    async fn judge(&self, kind: JudgeKind, request: JudgeRequest<'_>) -> AppResult<bool>;
}

/// The text-generation collaborator.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Produce an answer from the question and the passages (possibly
    /// empty, for the no-context path).
    async fn generate(&self, question: &str, passages: &[Passage]) -> AppResult<String>;
}

/// The live web search collaborator.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Search the web for the question, in the service's own ranking order.
    async fn search(&self, question: &str) -> AppResult<Vec<RetrievedText>>;
}
