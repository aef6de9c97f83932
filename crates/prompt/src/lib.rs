//! Prompt catalog for the Vetted CLI.
//!
//! This crate owns the prompt templates the answer workflow sends to the
//! LLM: three binary grading prompts and two generation prompts. Each
//! prompt ships as a built-in definition and can be overridden per
//! workspace by a YAML file in `.vetted/prompts/<id>.yml`.

pub mod builder;
pub mod catalog;
pub mod types;

pub use builder::render_prompt;
pub use catalog::{list_prompts, load_prompt, PromptEntry};
pub use types::{PromptDefinition, RenderedPrompt};
