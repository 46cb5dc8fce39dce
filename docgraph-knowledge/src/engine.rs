use std::sync::Arc;

use docgraph_core::LlmSettings;
use tracing::info;

use crate::KnowledgeSettings;
use crate::answer::{Answer, AnswerSynthesizer, LlmSynthesizer};
use crate::embeddings::{Embedder, EmbeddingClient};
use crate::errors::KnowledgeResult;
use crate::extract::{Extractor, LlmExtractor};
use crate::ingest::{IngestReport, Ingestor};
use crate::llm::ChatClient;
use crate::models::{EntityLabel, ParsedDocument};
use crate::paths::knowledge_db_path;
use crate::retrieval::{ContextBundle, RetrievalEngine};
use crate::storage::{EntityStore, SqliteEntityStore};

/// Question answering and ingestion over one explicitly owned store handle.
pub struct DocGraphEngine {
    settings: KnowledgeSettings,
    store: Arc<dyn EntityStore>,
    retrieval: RetrievalEngine,
    ingestor: Ingestor,
    synthesizer: Arc<dyn AnswerSynthesizer>,
}

impl DocGraphEngine {
    /// Open the SQLite store and wire the HTTP-backed collaborators.
    pub async fn open(
        settings: KnowledgeSettings,
        llm: &LlmSettings,
        api_key: Option<String>,
    ) -> KnowledgeResult<Self> {
        let path = knowledge_db_path(&settings)?;
        let store = SqliteEntityStore::open(&path, settings.embedding_dim).await?;
        let embedder = EmbeddingClient::new(&settings);
        let chat = ChatClient::new(llm, api_key)?;
        info!(db = %path.display(), model = %chat.model(), "docgraph engine ready");

        Ok(Self::from_parts(
            settings,
            Arc::new(store),
            Arc::new(embedder),
            Arc::new(LlmExtractor::new(chat.clone())),
            Arc::new(LlmSynthesizer::new(chat)),
        ))
    }

    /// Build from already constructed collaborators.
    pub fn from_parts(
        settings: KnowledgeSettings,
        store: Arc<dyn EntityStore>,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<dyn Extractor>,
        synthesizer: Arc<dyn AnswerSynthesizer>,
    ) -> Self {
        let retrieval = RetrievalEngine::new(
            Arc::clone(&store),
            Arc::clone(&embedder),
            settings.retrieval.clone(),
        );
        let ingestor = Ingestor::new(Arc::clone(&store), embedder, extractor);
        Self {
            settings,
            store,
            retrieval,
            ingestor,
            synthesizer,
        }
    }

    pub fn settings(&self) -> &KnowledgeSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub async fn retrieve(&self, question: &str) -> KnowledgeResult<ContextBundle> {
        self.retrieval.retrieve(question).await
    }

    pub async fn retrieve_context(&self, question: &str) -> KnowledgeResult<String> {
        self.retrieval.retrieve_context(question).await
    }

    /// Answer a question from the graph.
    ///
    /// When retrieval finds nothing the synthesizer is not called.
    pub async fn ask(&self, question: &str) -> KnowledgeResult<Answer> {
        let context = self.retrieval.retrieve_context(question).await?;
        if context.is_empty() {
            info!("no relevant context found");
            return Ok(Answer::NoContext);
        }

        let answer = self.synthesizer.generate(&context, question.trim()).await?;
        Ok(Answer::Answered { context, answer })
    }

    /// Upsert documents on top of the current graph.
    pub async fn ingest(&self, documents: &[ParsedDocument]) -> IngestReport {
        self.ingestor.ingest_all(documents).await
    }

    /// Clear the graph and ingest from scratch.
    pub async fn rebuild(&self, documents: &[ParsedDocument]) -> KnowledgeResult<IngestReport> {
        self.ingestor.rebuild(documents).await
    }

    /// Node count per label, in canonical order.
    pub async fn counts(&self) -> KnowledgeResult<Vec<(EntityLabel, usize)>> {
        let mut counts = Vec::with_capacity(EntityLabel::ALL.len());
        for label in EntityLabel::ALL {
            counts.push((label, self.store.count(label).await?));
        }
        Ok(counts)
    }
}
