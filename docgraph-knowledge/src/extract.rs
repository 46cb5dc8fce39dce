//! Schema-guided entity extraction from documentation markdown.

use async_trait::async_trait;
use tracing::debug;

use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::llm::ChatClient;
use crate::models::ExtractedData;

/// Raw page text in, typed entity set out.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, content: &str) -> KnowledgeResult<ExtractedData>;
}

const EXTRACTION_PROMPT: &str = r#"You are an expert entity extraction system. Your task is to parse technical documentation in Markdown format.
Identify all Components, Hooks, Utility Functions, and Type Definitions on the page.
- A Component is a JSX element like `<Background />`. It has props, which are usually in a Markdown table.
- A Hook is a function starting with "use", like `useNodes()`. It can have parameters and a return value.
- A Utility is a regular function like `addEdge()`. It can have parameters and a return value.
- A Type is a TypeScript definition, like `type Node = ...`.
If a page describes multiple entities (e.g., a component and its related types), extract all of them.

Respond with a single JSON object of this shape (omit or null any list with no entries):
{
  "components": [{"name": str, "description": str,
                  "props": [{"name": str, "type": str, "default": str | null, "description": str}]}],
  "hooks": [{"name": str, "description": str,
             "params": [{"name": str, "type": str, "description": str}], "return_value": str | null}],
  "utils": [{"name": str, "description": str,
             "params": [{"name": str, "type": str, "description": str}], "return_value": str | null}],
  "types": [{"name": str, "description": str}]
}"#;

/// Extraction backed by a chat model in JSON mode.
#[derive(Debug, Clone)]
pub struct LlmExtractor {
    client: ChatClient,
}

impl LlmExtractor {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, content: &str) -> KnowledgeResult<ExtractedData> {
        let user = format!("Documentation content:\n\n{}", content);
        let raw = self.client.complete(EXTRACTION_PROMPT, &user, true).await?;
        debug!(model = %self.client.model(), bytes = raw.len(), "extraction response");
        parse_extraction(&raw)
    }
}

/// Parse the model's JSON reply, tolerating a surrounding markdown fence.
pub fn parse_extraction(raw: &str) -> KnowledgeResult<ExtractedData> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim())
        .map_err(|e| KnowledgeError::Extraction(format!("invalid extraction JSON: {e}")))
}
