//! Configuration management for the Vetted CLI.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (.vetted/config.yaml)
//!
//! The configuration is workspace-centric, with prompt overrides and the
//! config file stored in `.vetted/`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// CLI behavior across commands, plus the bounds the answer workflow
/// enforces (retrieval depth, generation retry budget, collaborator
/// timeouts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .vetted/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider (e.g., "ollama", "openai", "claude")
    pub provider: String,

    /// Model identifier for generation and judging
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Custom LLM endpoint (provider default when unset)
    pub llm_endpoint: Option<String>,

    /// Endpoint of the document index collaborator
    pub retriever_endpoint: String,

    /// API key for the web search collaborator
    pub search_api_key: Option<String>,

    /// Workflow bounds
    pub flow: FlowSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Bounds applied by the answer workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSettings {
    /// How many passages to request from the index
    #[serde(rename = "topK")]
    pub top_k: usize,

    /// Maximum answer generations per run (initial attempt included)
    #[serde(rename = "maxGenerationAttempts")]
    pub max_generation_attempts: u32,

    /// Per-collaborator-call timeout in seconds
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            max_generation_attempts: 3,
            timeout_secs: 30,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    retriever: Option<RetrieverSection>,
    search: Option<SearchSection>,
    flow: Option<FlowSettings>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrieverSection {
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchSection {
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            llm_endpoint: None,
            retriever_endpoint: "http://localhost:8100".to_string(),
            search_api_key: None,
            flow: FlowSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `VETTED_WORKSPACE`: Override workspace path
    /// - `VETTED_CONFIG`: Path to config file
    /// - `VETTED_PROVIDER`: LLM provider
    /// - `VETTED_MODEL`: Model identifier
    /// - `VETTED_API_KEY`: LLM API key
    /// - `VETTED_RETRIEVER`: Document index endpoint
    /// - `TAVILY_API_KEY`: Web search API key (unless the config file names
    ///   a different variable)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("VETTED_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("VETTED_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".vetted/config.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("VETTED_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("VETTED_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("VETTED_RETRIEVER") {
            config.retriever_endpoint = endpoint;
        }

        if let Ok(key) = std::env::var("VETTED_API_KEY") {
            config.api_key = Some(key);
        }

        if config.search_api_key.is_none() {
            config.search_api_key = std::env::var("TAVILY_API_KEY").ok();
        }

        config.log_level = std::env::var("RUST_LOG").ok().or(config.log_level);

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.endpoint.is_some() {
                result.llm_endpoint = llm.endpoint;
            }
            if let Some(env_var) = llm.api_key_env {
                if let Ok(key) = std::env::var(&env_var) {
                    result.api_key = Some(key);
                }
            }
        }

        if let Some(retriever) = config_file.retriever {
            if let Some(endpoint) = retriever.endpoint {
                result.retriever_endpoint = endpoint;
            }
        }

        if let Some(search) = config_file.search {
            if let Some(env_var) = search.api_key_env {
                if let Ok(key) = std::env::var(&env_var) {
                    result.search_api_key = Some(key);
                }
            }
        }

        if let Some(flow) = config_file.flow {
            result.flow = flow;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .vetted directory.
    pub fn vetted_dir(&self) -> PathBuf {
        self.workspace.join(".vetted")
    }

    /// Ensure the .vetted directory exists.
    pub fn ensure_vetted_dir(&self) -> AppResult<()> {
        let vetted_dir = self.vetted_dir();
        if !vetted_dir.exists() {
            std::fs::create_dir_all(&vetted_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .vetted directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Validate configuration for the active provider and workflow bounds.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["ollama", "openai", "claude"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.flow.top_k == 0 {
            return Err(AppError::Config(
                "flow.topK must be at least 1".to_string(),
            ));
        }

        if self.flow.max_generation_attempts == 0 {
            return Err(AppError::Config(
                "flow.maxGenerationAttempts must be at least 1".to_string(),
            ));
        }

        if self.flow.timeout_secs == 0 {
            return Err(AppError::Config(
                "flow.timeoutSecs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
