//! Answer workflow for the Vetted CLI.
//!
//! This crate is the core of the system: a bounded state machine that turns
//! a question into a quality-gated answer. One run retrieves passages from
//! the document index, grades each for relevance, generates an answer,
//! checks the answer for groundedness and question-relevance, and either
//! returns it, retries generation, or escalates to live web search, all
//! within explicit retry and fallback budgets so every run terminates.
//!
//! External services (index, judge, generator, web search) sit behind the
//! async traits in [`collaborators`], which makes every decision point
//! deterministic under test. Concrete adapters for Ollama-backed judging
//! and generation, an HTTP document index, and the Tavily search API live
//! in [`adapters`].

pub mod adapters;
pub mod collaborators;
pub mod flow;
pub mod grade;
pub mod state;

#[cfg(test)]
mod tests;

// Re-export the public surface
pub use collaborators::{
    Generator, Judge, JudgeKind, JudgeRequest, RetrievedText, Retriever, WebSearch,
};
pub use flow::{FlowConfig, Workflow};
pub use state::{
    Answer, AnswerId, Degradation, Judgment, JudgmentSubject, JudgmentTarget, Passage, PassageId,
    PassageOrigin, RunReport,
};
