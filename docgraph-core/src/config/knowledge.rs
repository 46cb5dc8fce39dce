//! Knowledge graph configuration types.
//!
//! These types define the resolved (non-optional) settings used by
//! `docgraph-knowledge`. They are created from the user-facing TOML
//! `Settings` via `From`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::settings::{RetrievalSettings, Settings};

/// Resolved knowledge engine settings (all values filled with defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub embedding_dim: Option<usize>,
    #[serde(default)]
    pub knowledge_db_path_override: Option<PathBuf>,
    /// Override the root data directory for hand-off files and the database.
    /// When set, all paths derive from this root instead of
    /// `DOCGRAPH_DATA_DIR` / XDG. Primarily for testing.
    #[serde(default)]
    pub data_root_override: Option<PathBuf>,
    #[serde(default)]
    pub retrieval: RetrievalDefaults,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            embedding_dim: None,
            knowledge_db_path_override: None,
            data_root_override: None,
            retrieval: RetrievalDefaults::default(),
        }
    }
}

/// Resolved retrieval tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalDefaults {
    #[serde(default = "default_per_index_k")]
    pub per_index_k: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Minimum similarity a candidate needs to be surfaced. `None` keeps
    /// every nearest neighbour, however weak.
    #[serde(default)]
    pub min_score: Option<f32>,
}

impl Default for RetrievalDefaults {
    fn default() -> Self {
        Self {
            per_index_k: default_per_index_k(),
            max_results: default_max_results(),
            min_score: None,
        }
    }
}

fn default_embedding_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embedding_model() -> String {
    "qwen3-embedding:8b".to_string()
}

fn default_per_index_k() -> usize {
    3
}

fn default_max_results() -> usize {
    5
}

impl From<&Settings> for KnowledgeSettings {
    fn from(value: &Settings) -> Self {
        let mut settings = KnowledgeSettings {
            embedding_url: value.embedding.url.clone(),
            embedding_model: value.embedding.model.clone(),
            embedding_dim: value.embedding.dim,
            ..Default::default()
        };
        if let Some(path) = &value.storage.db_path {
            settings.knowledge_db_path_override = Some(PathBuf::from(path));
        }
        if let Some(path) = &value.storage.data_dir {
            settings.data_root_override = Some(PathBuf::from(path));
        }
        apply_retrieval_overrides(&mut settings.retrieval, &value.retrieval);
        settings
    }
}

fn apply_retrieval_overrides(retrieval: &mut RetrievalDefaults, overrides: &RetrievalSettings) {
    if let Some(k) = overrides.per_index_k {
        retrieval.per_index_k = k;
    }
    if let Some(max_results) = overrides.max_results {
        retrieval.max_results = max_results;
    }
    if let Some(min_score) = overrides.min_score {
        retrieval.min_score = Some(min_score);
    }
}
