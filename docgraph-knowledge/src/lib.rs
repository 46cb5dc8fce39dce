//! Documentation knowledge graph: crawl, parse, extract, store, retrieve, answer.

pub mod answer;
pub mod crawl;
pub mod documents;
pub mod embeddings;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod parser;
pub mod paths;
pub mod retrieval;
pub mod storage;

pub use answer::{Answer, AnswerSynthesizer, LlmSynthesizer, NO_CONTEXT_MESSAGE};
pub use crawl::{CrawlConfig, HttpFetcher, PageFetcher, crawl_site};
pub use docgraph_core::{KnowledgeSettings, RetrievalDefaults};
pub use embeddings::{Embedder, EmbeddingClient};
pub use engine::DocGraphEngine;
pub use errors::{KnowledgeError, KnowledgeResult};
pub use extract::{Extractor, LlmExtractor};
pub use ingest::{IngestReport, Ingestor};
pub use llm::ChatClient;
pub use models::{
    Candidate, Component, EntityLabel, EntityNode, ExtractedData, Hook, Param, ParsedDocument,
    Prop, RawPage, TypeDefinition, Util,
};
pub use parser::{html_to_markdown, parse_pages};
pub use retrieval::{ContextBundle, RetrievalEngine, extract_type_names, rank_candidates};
pub use storage::{EntityStore, MemoryEntityStore, SqliteEntityStore};
