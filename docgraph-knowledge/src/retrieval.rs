//! Context assembly for a question.
//!
//! The question is embedded once and run against every per-label vector
//! index. Hits are merged into one ranking, the best few are rendered as
//! entity blocks, and Type nodes named in the selected Props' type
//! signatures are appended as related definitions.
//!
//! Ranking is deterministic: score descending, then canonical label order
//! (Component, Prop, Hook, Util, Type), then rank inside the label's list.
//! The result does not depend on which index answers first.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, LazyLock};

use futures::future::join_all;
use regex::Regex;
use tracing::{debug, warn};

use crate::embeddings::Embedder;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::{Candidate, EntityLabel};
use crate::storage::EntityStore;
use docgraph_core::RetrievalDefaults;

static TYPE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][A-Za-z<>]+\b").expect("regex"));

/// Capitalized identifiers mentioned in a type signature.
///
/// Generic runs are split on angle brackets, so `Node<CustomData>` yields
/// `Node` and `CustomData`. A run must end on a word boundary, so `Node1`
/// yields nothing. No filtering beyond the leading capital.
pub fn extract_type_names(signature: &str) -> BTreeSet<String> {
    TYPE_NAME_RE
        .find_iter(signature)
        .flat_map(|m| m.as_str().split(['<', '>']))
        .filter(|segment| segment.starts_with(|c: char| c.is_ascii_uppercase()))
        .map(str::to_string)
        .collect()
}

/// Merge per-label hits into the global top `max_results`.
///
/// Candidates under `min_score` are dropped before ranking.
pub fn rank_candidates(
    mut candidates: Vec<Candidate>,
    max_results: usize,
    min_score: Option<f32>,
) -> Vec<Candidate> {
    if let Some(floor) = min_score {
        candidates.retain(|candidate| candidate.score >= floor);
    }
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.node.label.cmp(&b.node.label))
            .then_with(|| a.rank.cmp(&b.rank))
    });
    candidates.truncate(max_results);
    candidates
}

/// Everything retrieved for one question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextBundle {
    /// Selected entities, best first.
    pub entries: Vec<Candidate>,
    /// Type names found in the selected Props' signatures.
    pub type_names: BTreeSet<String>,
    /// `(name, description)` of the Type nodes matching `type_names`.
    pub related_types: Vec<(String, String)>,
}

impl ContextBundle {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ContextBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let node = &entry.node;
            writeln!(f, "Found Entity: {} (Type: {})", node.name, node.label)?;
            writeln!(f, "Description: {}", node.description)?;
            if node.label == EntityLabel::Prop {
                writeln!(
                    f,
                    "This is a prop for the '{}' component.",
                    node.component.as_deref().unwrap_or("N/A")
                )?;
            }
            writeln!(f, "---")?;
        }

        if !self.type_names.is_empty() {
            write!(f, "\nRelated Type Definitions:\n")?;
            for (name, description) in &self.related_types {
                writeln!(f, "- {}: {}", name, description)?;
            }
        }
        Ok(())
    }
}

/// Read-only question-to-context engine over an entity store.
#[derive(Clone)]
pub struct RetrievalEngine {
    store: Arc<dyn EntityStore>,
    embedder: Arc<dyn Embedder>,
    options: RetrievalDefaults,
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<dyn EntityStore>,
        embedder: Arc<dyn Embedder>,
        options: RetrievalDefaults,
    ) -> Self {
        Self {
            store,
            embedder,
            options,
        }
    }

    pub fn options(&self) -> &RetrievalDefaults {
        &self.options
    }

    pub async fn retrieve(&self, question: &str) -> KnowledgeResult<ContextBundle> {
        let question = question.trim();
        if question.is_empty() {
            return Err(KnowledgeError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let vector = self.embedder.embed(question).await?;

        let searches = EntityLabel::ALL
            .iter()
            .map(|&label| self.search_label(label, &vector));
        let candidates: Vec<Candidate> = join_all(searches).await.into_iter().flatten().collect();
        debug!(candidates = candidates.len(), "collected candidates");

        let entries = rank_candidates(
            candidates,
            self.options.max_results,
            self.options.min_score,
        );

        let type_names: BTreeSet<String> = entries
            .iter()
            .filter(|entry| entry.node.label == EntityLabel::Prop)
            .filter_map(|entry| entry.node.type_signature.as_deref())
            .flat_map(extract_type_names)
            .collect();

        let related_types = if type_names.is_empty() {
            Vec::new()
        } else {
            let names: Vec<String> = type_names.iter().cloned().collect();
            match self.store.exact_match(EntityLabel::Type, &names).await {
                Ok(found) => found,
                Err(err) => {
                    warn!(error = %err, "related type lookup failed");
                    Vec::new()
                }
            }
        };

        debug!(
            entries = entries.len(),
            type_names = type_names.len(),
            related = related_types.len(),
            "assembled context"
        );

        Ok(ContextBundle {
            entries,
            type_names,
            related_types,
        })
    }

    /// Rendered context; empty when nothing relevant was found.
    pub async fn retrieve_context(&self, question: &str) -> KnowledgeResult<String> {
        Ok(self.retrieve(question).await?.to_string())
    }

    async fn search_label(&self, label: EntityLabel, vector: &[f32]) -> Vec<Candidate> {
        match self
            .store
            .vector_search(label, self.options.per_index_k, vector)
            .await
        {
            Ok(hits) => hits
                .into_iter()
                .enumerate()
                .map(|(rank, (node, score))| Candidate { node, score, rank })
                .collect(),
            Err(err) => {
                warn!(index = label.index_name(), error = %err, "vector index query failed");
                Vec::new()
            }
        }
    }
}
