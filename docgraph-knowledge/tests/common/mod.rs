//! Shared fakes for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docgraph_knowledge::{
    AnswerSynthesizer, Component, DocGraphEngine, Embedder, ExtractedData, Extractor, Hook,
    KnowledgeError, KnowledgeResult, KnowledgeSettings, MemoryEntityStore, Prop, TypeDefinition,
};

/// Bag-of-keywords embedding: one dimension per keyword (substring count in
/// the lowercased text) plus a constant bias dimension.
pub struct KeywordEmbedder {
    keywords: Vec<&'static str>,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&'static str]) -> Self {
        Self {
            keywords: keywords.to_vec(),
        }
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> KnowledgeResult<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = self
            .keywords
            .iter()
            .map(|keyword| lower.matches(keyword).count() as f32)
            .collect();
        vector.push(1.0);
        Ok(vector)
    }
}

/// Returns canned extraction results keyed by document content.
#[derive(Default)]
pub struct CannedExtractor {
    responses: HashMap<String, ExtractedData>,
    pub calls: AtomicUsize,
}

impl CannedExtractor {
    pub fn with(mut self, content: &str, data: ExtractedData) -> Self {
        self.responses.insert(content.to_string(), data);
        self
    }
}

#[async_trait]
impl Extractor for CannedExtractor {
    async fn extract(&self, content: &str) -> KnowledgeResult<ExtractedData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(content)
            .cloned()
            .ok_or_else(|| KnowledgeError::Extraction(format!("no canned data for {content:?}")))
    }
}

/// Records every call and answers with a fixed string.
#[derive(Default)]
pub struct RecordingSynthesizer {
    pub calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl AnswerSynthesizer for RecordingSynthesizer {
    async fn generate(&self, context: &str, question: &str) -> KnowledgeResult<String> {
        self.calls
            .lock()
            .expect("lock")
            .push((context.to_string(), question.to_string()));
        Ok("nodeOrigin sets the anchor point of a node.".to_string())
    }
}

pub const KEYWORDS: &[&str] = &["origin", "node", "viewport", "fit", "position"];

pub const REACT_FLOW_PAGE: &str = "### ReactFlow\nThe ReactFlow component is the heart of your app.";
pub const VIEWPORT_PAGE: &str = "### useViewport()\nReturns the viewport transform.";

pub fn prop(name: &str, type_signature: &str, description: &str) -> Prop {
    Prop {
        name: name.to_string(),
        type_signature: type_signature.to_string(),
        default: None,
        description: description.to_string(),
    }
}

/// ReactFlow with two props and an XYPosition type.
pub fn react_flow_extraction() -> ExtractedData {
    ExtractedData {
        components: Some(vec![Component {
            name: "ReactFlow".to_string(),
            description: "The ReactFlow component is the heart of your app.".to_string(),
            props: Some(vec![
                Prop {
                    default: Some("[0, 0]".to_string()),
                    ..prop(
                        "nodeOrigin",
                        "[number, number]",
                        "The origin of the node relative to its position.",
                    )
                },
                prop("fitView", "boolean", "Zoom to fit all nodes on initial render."),
            ]),
        }]),
        hooks: None,
        utils: None,
        types: Some(vec![TypeDefinition {
            name: "XYPosition".to_string(),
            description: "Position in the flow's coordinate system.".to_string(),
        }]),
    }
}

pub fn viewport_extraction() -> ExtractedData {
    ExtractedData {
        hooks: Some(vec![Hook {
            name: "useViewport".to_string(),
            description: "Returns the viewport transform of the viewport.".to_string(),
            params: None,
            return_value: Some("Viewport".to_string()),
        }]),
        ..Default::default()
    }
}

pub struct Harness {
    pub engine: DocGraphEngine,
    pub store: Arc<MemoryEntityStore>,
    pub extractor: Arc<CannedExtractor>,
    pub synthesizer: Arc<RecordingSynthesizer>,
}

pub fn harness(extractor: CannedExtractor) -> Harness {
    let store = Arc::new(MemoryEntityStore::new());
    let extractor = Arc::new(extractor);
    let synthesizer = Arc::new(RecordingSynthesizer::default());
    let engine = DocGraphEngine::from_parts(
        KnowledgeSettings::default(),
        store.clone(),
        Arc::new(KeywordEmbedder::new(KEYWORDS)),
        extractor.clone(),
        synthesizer.clone(),
    );
    Harness {
        engine,
        store,
        extractor,
        synthesizer,
    }
}

pub fn default_extractor() -> CannedExtractor {
    CannedExtractor::default()
        .with(REACT_FLOW_PAGE, react_flow_extraction())
        .with(VIEWPORT_PAGE, viewport_extraction())
}
