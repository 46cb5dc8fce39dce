use std::path::PathBuf;

use crate::KnowledgeSettings;
use crate::errors::{KnowledgeError, KnowledgeResult};

pub const RAW_PAGES_FILE: &str = "scraped_content_raw.json";
pub const PARSED_DOCUMENTS_FILE: &str = "parsed_structured_content.json";
pub const GRAPH_DB_FILE: &str = "graph.sqlite3";

pub fn data_root(settings: &KnowledgeSettings) -> KnowledgeResult<PathBuf> {
    if let Some(path) = &settings.data_root_override {
        return Ok(path.clone());
    }

    if let Ok(override_dir) = std::env::var("DOCGRAPH_DATA_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let dir = dirs::data_dir().ok_or(KnowledgeError::MissingDataDir)?;
    Ok(dir.join("docgraph"))
}

pub fn raw_pages_path(settings: &KnowledgeSettings) -> KnowledgeResult<PathBuf> {
    Ok(data_root(settings)?.join(RAW_PAGES_FILE))
}

pub fn parsed_documents_path(settings: &KnowledgeSettings) -> KnowledgeResult<PathBuf> {
    Ok(data_root(settings)?.join(PARSED_DOCUMENTS_FILE))
}

pub fn knowledge_db_path(settings: &KnowledgeSettings) -> KnowledgeResult<PathBuf> {
    if let Some(path) = &settings.knowledge_db_path_override {
        return Ok(path.clone());
    }
    Ok(data_root(settings)?.join(GRAPH_DB_FILE))
}
