//! Ingestion: extracted entities to embedded, upserted graph nodes.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::embeddings::Embedder;
use crate::errors::KnowledgeResult;
use crate::extract::Extractor;
use crate::models::{EntityLabel, EntityNode, ExtractedData, ParsedDocument, Prop};
use crate::storage::EntityStore;

/// Text embedded for a Prop: name, type signature and description.
pub fn prop_embedding_text(prop: &Prop) -> String {
    format!(
        "Prop: {}, Type: {}, Description: {}",
        prop.name, prop.type_signature, prop.description
    )
}

/// Outcome of a batch ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents_processed: usize,
    pub documents_skipped: usize,
    pub documents_failed: usize,
    /// Nodes written per label (re-writes of an existing key count again).
    pub entities: BTreeMap<EntityLabel, usize>,
}

impl IngestReport {
    fn absorb(&mut self, counts: BTreeMap<EntityLabel, usize>) {
        for (label, n) in counts {
            *self.entities.entry(label).or_default() += n;
        }
    }

    pub fn total_entities(&self) -> usize {
        self.entities.values().sum()
    }
}

pub struct Ingestor {
    store: Arc<dyn EntityStore>,
    embedder: Arc<dyn Embedder>,
    extractor: Arc<dyn Extractor>,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn EntityStore>,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            store,
            embedder,
            extractor,
        }
    }

    /// Extract one document and upsert everything found in it.
    ///
    /// Returns the number of nodes written per label.
    pub async fn ingest(
        &self,
        document: &ParsedDocument,
    ) -> KnowledgeResult<BTreeMap<EntityLabel, usize>> {
        let data = self.extractor.extract(&document.content).await?;
        if data.is_empty() {
            debug!(url = %document.url, "no entities extracted");
            return Ok(BTreeMap::new());
        }
        self.write_entities(&data, &document.url).await
    }

    async fn write_entities(
        &self,
        data: &ExtractedData,
        url: &str,
    ) -> KnowledgeResult<BTreeMap<EntityLabel, usize>> {
        let mut counts = BTreeMap::new();
        let mut bump = |label: EntityLabel| *counts.entry(label).or_insert(0usize) += 1;

        for component in data.components.iter().flatten() {
            let node = EntityNode::component(&component.name, &component.description, url);
            let vector = self.embedder.embed(&component.description).await?;
            self.store.upsert_component(&node, &vector).await?;
            bump(EntityLabel::Component);
            debug!(component = %component.name, "ingested component");

            for prop in component.props.iter().flatten() {
                let node = EntityNode::prop(&component.name, prop);
                let vector = self.embedder.embed(&prop_embedding_text(prop)).await?;
                self.store.upsert_prop(&node, &vector).await?;
                bump(EntityLabel::Prop);
            }
        }

        for hook in data.hooks.iter().flatten() {
            let vector = self.embedder.embed(&hook.description).await?;
            self.store
                .upsert_hook(&EntityNode::hook(hook, url), &vector)
                .await?;
            bump(EntityLabel::Hook);
        }

        for util in data.utils.iter().flatten() {
            let vector = self.embedder.embed(&util.description).await?;
            self.store
                .upsert_util(&EntityNode::util(util, url), &vector)
                .await?;
            bump(EntityLabel::Util);
        }

        for type_def in data.types.iter().flatten() {
            let vector = self.embedder.embed(&type_def.description).await?;
            self.store
                .upsert_type(&EntityNode::type_definition(type_def, url), &vector)
                .await?;
            bump(EntityLabel::Type);
        }

        Ok(counts)
    }

    /// Ingest documents one at a time. A failing document is logged and
    /// skipped; whatever it wrote before failing stays in the store.
    pub async fn ingest_all(&self, documents: &[ParsedDocument]) -> IngestReport {
        let mut report = IngestReport::default();

        for (i, document) in documents.iter().enumerate() {
            if document.content.trim().is_empty() {
                debug!(url = %document.url, "empty document, skipping");
                report.documents_skipped += 1;
                continue;
            }

            debug!(url = %document.url, n = i + 1, total = documents.len(), "ingesting document");
            match self.ingest(document).await {
                Ok(counts) => {
                    report.documents_processed += 1;
                    report.absorb(counts);
                }
                Err(err) => {
                    warn!(url = %document.url, error = %err, "failed to ingest document");
                    report.documents_failed += 1;
                }
            }
        }

        info!(
            processed = report.documents_processed,
            skipped = report.documents_skipped,
            failed = report.documents_failed,
            entities = report.total_entities(),
            "ingestion complete"
        );
        report
    }

    /// Clear the store, then ingest from scratch.
    pub async fn rebuild(&self, documents: &[ParsedDocument]) -> KnowledgeResult<IngestReport> {
        self.store.delete_all().await?;
        info!("entity store cleared");
        Ok(self.ingest_all(documents).await)
    }
}
