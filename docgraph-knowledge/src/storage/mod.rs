//! Entity store: the graph of documentation nodes plus one vector index per label.

mod memory;
mod sqlite;

use async_trait::async_trait;

use crate::errors::KnowledgeResult;
use crate::models::{EntityLabel, EntityNode};

pub use memory::MemoryEntityStore;
pub use sqlite::SqliteEntityStore;

/// Storage seam used by ingestion (writes) and retrieval (reads).
///
/// Upserts are keyed: Components, Hooks, Utils and Types by name, Props by
/// `(component, name)`. Writing the same key again overwrites attributes and
/// embedding.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// k nearest nodes of one label, best first, with similarity scores
    /// (higher is closer). An index that has never been written returns
    /// an empty list.
    async fn vector_search(
        &self,
        label: EntityLabel,
        k: usize,
        vector: &[f32],
    ) -> KnowledgeResult<Vec<(EntityNode, f32)>>;

    /// `(name, description)` for every node of `label` whose name is in
    /// `names`, ordered by name.
    async fn exact_match(
        &self,
        label: EntityLabel,
        names: &[String],
    ) -> KnowledgeResult<Vec<(String, String)>>;

    async fn upsert_component(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()>;

    /// Fails with `UnknownComponent` when `node.component` does not name a
    /// stored Component.
    async fn upsert_prop(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()>;

    async fn upsert_hook(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()>;

    async fn upsert_util(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()>;

    async fn upsert_type(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()>;

    /// Remove every node, edge and vector.
    async fn delete_all(&self) -> KnowledgeResult<()>;

    async fn count(&self, label: EntityLabel) -> KnowledgeResult<usize>;
}
