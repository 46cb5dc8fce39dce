use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::EntityStore;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::{EntityLabel, EntityNode};

/// (label, name, owning component or "")
type NodeKey = (EntityLabel, String, String);

/// In-process store with brute-force cosine similarity.
///
/// Same keying and Prop ownership rules as the SQLite store. Used by tests
/// and by dry runs that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    nodes: RwLock<BTreeMap<NodeKey, (EntityNode, Vec<f32>)>>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn insert(&self, label: EntityLabel, node: &EntityNode, embedding: &[f32]) {
        let key = (
            label,
            node.name.clone(),
            node.component.clone().unwrap_or_default(),
        );
        let mut stored = node.clone();
        stored.label = label;
        self.nodes
            .write()
            .await
            .insert(key, (stored, embedding.to_vec()));
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn vector_search(
        &self,
        label: EntityLabel,
        k: usize,
        vector: &[f32],
    ) -> KnowledgeResult<Vec<(EntityNode, f32)>> {
        let nodes = self.nodes.read().await;
        let mut hits: Vec<(EntityNode, f32)> = nodes
            .iter()
            .filter(|((node_label, _, _), _)| *node_label == label)
            .map(|(_, (node, embedding))| (node.clone(), cosine_similarity(vector, embedding)))
            .collect();

        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits.truncate(k);
        Ok(hits)
    }

    async fn exact_match(
        &self,
        label: EntityLabel,
        names: &[String],
    ) -> KnowledgeResult<Vec<(String, String)>> {
        let nodes = self.nodes.read().await;
        let mut matches: Vec<(String, String)> = nodes
            .values()
            .filter(|(node, _)| node.label == label && names.contains(&node.name))
            .map(|(node, _)| (node.name.clone(), node.description.clone()))
            .collect();
        matches.sort();
        Ok(matches)
    }

    async fn upsert_component(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()> {
        self.insert(EntityLabel::Component, node, embedding).await;
        Ok(())
    }

    async fn upsert_prop(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()> {
        let component = node.component.clone().unwrap_or_default();
        let owner_key = (EntityLabel::Component, component.clone(), String::new());
        if !self.nodes.read().await.contains_key(&owner_key) {
            return Err(KnowledgeError::UnknownComponent {
                component,
                prop: node.name.clone(),
            });
        }
        self.insert(EntityLabel::Prop, node, embedding).await;
        Ok(())
    }

    async fn upsert_hook(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()> {
        self.insert(EntityLabel::Hook, node, embedding).await;
        Ok(())
    }

    async fn upsert_util(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()> {
        self.insert(EntityLabel::Util, node, embedding).await;
        Ok(())
    }

    async fn upsert_type(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()> {
        self.insert(EntityLabel::Type, node, embedding).await;
        Ok(())
    }

    async fn delete_all(&self) -> KnowledgeResult<()> {
        self.nodes.write().await.clear();
        Ok(())
    }

    async fn count(&self, label: EntityLabel) -> KnowledgeResult<usize> {
        Ok(self
            .nodes
            .read()
            .await
            .keys()
            .filter(|(node_label, _, _)| *node_label == label)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_prop_requires_component() {
        let store = MemoryEntityStore::new();
        let mut prop = EntityNode::new(EntityLabel::Prop, "nodeOrigin", "Origin");
        prop.component = Some("ReactFlow".to_string());

        let err = store.upsert_prop(&prop, &[1.0, 0.0]).await.unwrap_err();
        assert!(matches!(err, KnowledgeError::UnknownComponent { .. }));

        let component = EntityNode::component("ReactFlow", "Main", "https://reactflow.dev/api-reference/react-flow");
        store.upsert_component(&component, &[0.0, 1.0]).await.unwrap();
        store.upsert_prop(&prop, &[1.0, 0.0]).await.unwrap();
        assert_eq!(store.count(EntityLabel::Prop).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_vector_search_is_label_scoped_and_sorted() {
        let store = MemoryEntityStore::new();
        let far = EntityNode::new(EntityLabel::Type, "Edge", "An edge");
        let near = EntityNode::new(EntityLabel::Type, "Node", "A node");
        let hook = EntityNode::new(EntityLabel::Hook, "useNodes", "Nodes hook");
        store.upsert_type(&far, &[0.0, 1.0]).await.unwrap();
        store.upsert_type(&near, &[1.0, 0.1]).await.unwrap();
        store.upsert_hook(&hook, &[1.0, 0.0]).await.unwrap();

        let hits = store
            .vector_search(EntityLabel::Type, 3, &[1.0, 0.0])
            .await
            .unwrap();
        let names: Vec<&str> = hits.iter().map(|(node, _)| node.name.as_str()).collect();
        assert_eq!(names, vec!["Node", "Edge"]);
        assert!(hits[0].1 > hits[1].1);
    }
}
