//! Secrets configuration loaded from environment variables only.
//!
//! This module handles sensitive configuration like API keys that should
//! never be stored in files. All secrets are read from environment variables.

use std::env;

/// Secrets loaded exclusively from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// API key for the chat-completions endpoint (env var named by `llm.api_key_env`)
    pub llm_api_key: Option<String>,
}

/// Errors that can occur when loading secrets
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("Missing required secret: {0}")]
    MissingSecret(String),
}

impl Secrets {
    /// Load secrets from environment variables.
    ///
    /// This function also loads .env file if present (for development),
    /// but production should rely on actual environment variables.
    pub fn from_env(api_key_env: &str) -> Self {
        let _ = dotenvy::dotenv();

        Self::from_env_inner(api_key_env)
    }

    /// Internal method to load from environment without loading .env
    pub(crate) fn from_env_inner(api_key_env: &str) -> Self {
        Self {
            llm_api_key: env::var(api_key_env).ok().filter(|key| !key.trim().is_empty()),
        }
    }

    /// Return the LLM API key or fail naming the variable that should hold it.
    pub fn require_llm_api_key(&self, api_key_env: &str) -> Result<&str, SecretsError> {
        self.llm_api_key
            .as_deref()
            .ok_or_else(|| SecretsError::MissingSecret(api_key_env.to_string()))
    }
}
