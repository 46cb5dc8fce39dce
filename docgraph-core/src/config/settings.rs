//! Settings configuration loaded from TOML files.
//!
//! This module handles non-sensitive configuration stored in TOML format
//! in the XDG config directory (~/.config/docgraph/config.toml).

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# docgraph configuration file
# Located at: ~/.config/docgraph/config.toml
#
# This file contains non-sensitive configuration.
# The LLM API key is loaded from the environment variable named by
# `llm.api_key_env` (OPENAI_API_KEY by default).

[crawl]
seed_url = "https://reactflow.dev/api-reference"
delay_ms = 200
timeout_seconds = 15
user_agent = "Mozilla/5.0"
# max_pages = 500

[embedding]
url = "http://127.0.0.1:11434"
model = "qwen3-embedding:8b"
# dim = 4096

[llm]
base_url = "https://api.openai.com/v1"
model = "gpt-4o"
temperature = 0.0
max_tokens = 4096
api_key_env = "OPENAI_API_KEY"

[retrieval]
per_index_k = 3
max_results = 5
# min_score = 0.35

[storage]
# data_dir = "/var/lib/docgraph"
# db_path = "/var/lib/docgraph/graph.sqlite3"

[logging]
level = "info"
"#;

/// Settings loaded from TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Crawler configuration
    #[serde(default)]
    pub crawl: CrawlSettings,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Chat-completions model used for extraction and answers
    #[serde(default)]
    pub llm: LlmSettings,

    /// Retrieval tuning knobs
    #[serde(default)]
    pub retrieval: RetrievalSettings,

    /// Storage locations
    #[serde(default)]
    pub storage: StorageSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Crawler settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlSettings {
    /// First page of the documentation site; its host bounds the crawl
    #[serde(default = "default_seed_url")]
    pub seed_url: String,

    /// Pause between two page fetches in milliseconds
    #[serde(default = "default_crawl_delay_ms")]
    pub delay_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_crawl_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Stop after this many fetched pages (unbounded when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
}

/// Embedding service settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingSettings {
    /// Embedding provider base URL
    #[serde(default = "default_embedding_url")]
    pub url: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,
}

/// LLM settings (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    /// Name of the env var holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Retrieval settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetrievalSettings {
    /// Nearest neighbours fetched from each per-label index
    pub per_index_k: Option<usize>,

    /// Global number of entities kept after cross-label ranking
    pub max_results: Option<usize>,

    /// Drop candidates scoring below this similarity
    pub min_score: Option<f32>,
}

/// Storage settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Directory for hand-off JSON files and the graph database
    pub data_dir: Option<String>,

    /// Explicit path of the graph database
    pub db_path: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_seed_url() -> String {
    "https://reactflow.dev/api-reference".to_string()
}

fn default_crawl_delay_ms() -> u64 {
    200
}

fn default_crawl_timeout_seconds() -> u64 {
    15
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_embedding_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embedding_model() -> String {
    "qwen3-embedding:8b".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_llm_max_tokens() -> u32 {
    4096
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            seed_url: default_seed_url(),
            delay_ms: default_crawl_delay_ms(),
            timeout_seconds: default_crawl_timeout_seconds(),
            user_agent: default_user_agent(),
            max_pages: None,
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_embedding_model(),
            dim: None,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: 0.0,
            max_tokens: default_llm_max_tokens(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    /// The file is located at `~/.config/docgraph/config.toml`.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    /// Load settings from an explicit file path (no default file is created).
    pub fn load_from_path(path: &PathBuf) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Serialize settings to TOML content.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the configuration file path.
    ///
    /// Uses XDG config directory: `~/.config/docgraph/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("DOCGRAPH_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("docgraph");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &PathBuf) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG_TOML)?;

        Ok(())
    }

    /// Save settings to a specific file path.
    pub fn save_to_path(&self, path: &PathBuf) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        fs::write(path, content)?;
        Ok(())
    }
}
