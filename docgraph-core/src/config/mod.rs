//! Configuration management for docgraph.
//!
//! This module provides a unified configuration system that separates
//! secrets (from environment variables) from settings (from TOML files).
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `OPENAI_API_KEY` - chat-completions API key (name configurable via `llm.api_key_env`)
//!
//! ## Settings (TOML File)
//! Located at `~/.config/docgraph/config.toml`:
//! ```toml
//! [crawl]
//! seed_url = "https://reactflow.dev/api-reference"
//!
//! [embedding]
//! url = "http://127.0.0.1:11434"
//! model = "qwen3-embedding:8b"
//!
//! [llm]
//! model = "gpt-4o"
//!
//! [retrieval]
//! per_index_k = 3
//! max_results = 5
//! ```

pub mod knowledge;
mod secrets;
mod settings;

pub use knowledge::{KnowledgeSettings, RetrievalDefaults};
pub use secrets::{Secrets, SecretsError};
pub use settings::{
    CrawlSettings, EmbeddingSettings, LlmSettings, LoggingSettings, RetrievalSettings, Settings,
    SettingsError, StorageSettings,
};

/// Combined configuration containing both secrets and settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// This loads:
    /// 1. Settings from the TOML file (creating defaults if needed)
    /// 2. Secrets from environment variables, using the key name from settings
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Settings::load()?;
        Ok(Self::from_settings(settings))
    }

    /// Build a configuration around already-loaded settings.
    pub fn from_settings(settings: Settings) -> Self {
        let secrets = Secrets::from_env(&settings.llm.api_key_env);
        Self { secrets, settings }
    }

    /// Resolved settings for the knowledge crate.
    pub fn knowledge_settings(&self) -> KnowledgeSettings {
        KnowledgeSettings::from(&self.settings)
    }

    /// Get the LLM API key, failing when it is not configured.
    pub fn llm_api_key(&self) -> Result<&str, ConfigError> {
        Ok(self
            .secrets
            .require_llm_api_key(&self.settings.llm.api_key_env)?)
    }
}

/// Load .env file if it exists (for development convenience).
///
/// This is called automatically by `Config::load()` but is also
/// exported for use in other contexts.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_api_key_required() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "DOCGRAPH_TEST_UNSET_KEY".to_string();
        let config = Config {
            secrets: Secrets::default(),
            settings,
        };

        let err = config.llm_api_key().unwrap_err();
        assert!(matches!(err, ConfigError::Secrets(_)));
    }

    #[test]
    fn test_knowledge_settings_follow_settings() {
        let mut settings = Settings::default();
        settings.retrieval.max_results = Some(7);
        let config = Config {
            secrets: Secrets {
                llm_api_key: Some("sk-test".to_string()),
            },
            settings,
        };

        assert_eq!(config.llm_api_key().unwrap(), "sk-test");
        assert_eq!(config.knowledge_settings().retrieval.max_results, 7);
    }
}
