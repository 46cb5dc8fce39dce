//! Live tests against a local embedding server and a chat endpoint
//! (requires --features live-tests).
//!
//! Run with: cargo test --features live-tests --test live

#![cfg(feature = "live-tests")]

use docgraph_core::Config;
use docgraph_knowledge::{
    ChatClient, EmbeddingClient, ExtractedData, Extractor, KnowledgeSettings, LlmExtractor,
};

#[tokio::test]
async fn test_ollama_embedding_live() {
    let settings = KnowledgeSettings::default();
    let client = EmbeddingClient::new(&settings);
    let inputs = vec![
        "What is nodeOrigin?".to_string(),
        "The origin of the node relative to its position.".to_string(),
    ];

    let embeddings = client.embed_batch(&inputs).await.expect("embedding request");
    assert_eq!(embeddings.len(), inputs.len());
    let dim = embeddings[0].len();
    assert!(dim > 0);
    assert!(embeddings.iter().all(|vec| vec.len() == dim));
}

#[tokio::test]
async fn test_llm_extraction_live() {
    docgraph_core::load_dotenv();
    let config = Config::load().expect("load config");
    let Ok(api_key) = config.llm_api_key() else {
        eprintln!("LLM API key not set; skipping extraction live test.");
        return;
    };

    let client = ChatClient::new(&config.settings.llm, Some(api_key.to_string()))
        .expect("chat client");
    let extractor = LlmExtractor::new(client);
    let content = "### useNodes()\nThis hook returns an array of the current nodes.\n\
                   Returns: Node[]";

    let data: ExtractedData = extractor.extract(content).await.expect("extraction");
    let hooks = data.hooks.expect("hooks");
    assert!(hooks.iter().any(|hook| hook.name.contains("useNodes")));
}
