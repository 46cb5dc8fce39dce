//! JSON hand-off files between pipeline stages.
//!
//! Crawl output is an array of `{url, html}`; parser output is an array of
//! `{url, content}`. Both are pretty printed UTF-8.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::errors::KnowledgeResult;

pub async fn load_json<T: DeserializeOwned>(path: &Path) -> KnowledgeResult<Vec<T>> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

pub async fn save_json<T: Serialize>(path: &Path, items: &[T]) -> KnowledgeResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_string_pretty(items)?;
    tokio::fs::write(path, payload).await?;
    info!(path = %path.display(), count = items.len(), "saved documents");
    Ok(())
}
