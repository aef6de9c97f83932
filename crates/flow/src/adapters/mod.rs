//! Concrete collaborator implementations.
//!
//! These adapters connect the workflow's trait seams to real services:
//! LLM-backed judging and generation, an HTTP document index, and the
//! Tavily web search API.

pub mod llm;
pub mod retriever;
pub mod tavily;

pub use llm::{LlmGenerator, LlmJudge};
pub use retriever::HttpRetriever;
pub use tavily::TavilyClient;
