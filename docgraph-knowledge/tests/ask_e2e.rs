mod common;

use std::sync::atomic::Ordering;

use common::{REACT_FLOW_PAGE, VIEWPORT_PAGE, default_extractor, harness, prop};
use docgraph_knowledge::{
    Answer, Component, EntityLabel, EntityStore, ExtractedData, KnowledgeError, ParsedDocument,
    TypeDefinition,
};

const NODE_ORIGIN_QUESTION: &str = "What is the nodeOrigin prop and what does its type mean?";

fn documents() -> Vec<ParsedDocument> {
    vec![
        ParsedDocument {
            url: "https://reactflow.dev/api-reference/react-flow".to_string(),
            content: REACT_FLOW_PAGE.to_string(),
        },
        ParsedDocument {
            url: "https://reactflow.dev/api-reference/hooks/use-viewport".to_string(),
            content: VIEWPORT_PAGE.to_string(),
        },
    ]
}

#[tokio::test]
async fn test_node_origin_question_end_to_end() {
    let h = harness(default_extractor());
    let report = h.engine.rebuild(&documents()).await.unwrap();
    assert_eq!(report.documents_processed, 2);
    assert_eq!(report.documents_failed, 0);

    let answer = h.engine.ask(NODE_ORIGIN_QUESTION).await.unwrap();
    let Answer::Answered { context, answer } = answer else {
        panic!("expected an answer");
    };
    assert_eq!(answer, "nodeOrigin sets the anchor point of a node.");

    insta::assert_snapshot!(context.trim_end(), @r"
    Found Entity: nodeOrigin (Type: Prop)
    Description: The origin of the node relative to its position.
    This is a prop for the 'ReactFlow' component.
    ---
    Found Entity: ReactFlow (Type: Component)
    Description: The ReactFlow component is the heart of your app.
    ---
    Found Entity: fitView (Type: Prop)
    Description: Zoom to fit all nodes on initial render.
    This is a prop for the 'ReactFlow' component.
    ---
    Found Entity: XYPosition (Type: Type)
    Description: Position in the flow's coordinate system.
    ---
    Found Entity: useViewport (Type: Hook)
    Description: Returns the viewport transform of the viewport.
    ---
    ");
    assert!(!context.contains("Related Type Definitions"));

    let calls = h.synthesizer.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, context);
    assert_eq!(calls[0].1, NODE_ORIGIN_QUESTION);
}

#[tokio::test]
async fn test_empty_graph_skips_synthesizer() {
    let h = harness(default_extractor());

    let context = h.engine.retrieve_context("What is nodeOrigin?").await.unwrap();
    assert_eq!(context, "");

    let answer = h.engine.ask("What is nodeOrigin?").await.unwrap();
    assert_eq!(answer, Answer::NoContext);
    assert!(answer.text().starts_with("I'm sorry, I couldn't find any relevant information"));
    assert!(h.synthesizer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_question_is_invalid_input() {
    let h = harness(default_extractor());
    h.engine.rebuild(&documents()).await.unwrap();

    let err = h.engine.ask("  ").await.unwrap_err();
    assert!(matches!(err, KnowledgeError::InvalidInput(_)));
    assert!(h.synthesizer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reingest_does_not_duplicate_nodes() {
    let h = harness(default_extractor());
    let docs = documents();

    h.engine.ingest(&docs).await;
    let first = h.engine.counts().await.unwrap();
    h.engine.ingest(&docs).await;
    let second = h.engine.counts().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        second,
        vec![
            (EntityLabel::Component, 1),
            (EntityLabel::Prop, 2),
            (EntityLabel::Hook, 1),
            (EntityLabel::Util, 0),
            (EntityLabel::Type, 1),
        ]
    );
    assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_failed_document_is_skipped() {
    let h = harness(default_extractor());
    let mut docs = documents();
    docs.insert(
        1,
        ParsedDocument {
            url: "https://reactflow.dev/broken".to_string(),
            content: "extraction model returns garbage for this one".to_string(),
        },
    );
    docs.push(ParsedDocument {
        url: "https://reactflow.dev/empty".to_string(),
        content: "   ".to_string(),
    });

    let report = h.engine.ingest(&docs).await;
    assert_eq!(report.documents_processed, 2);
    assert_eq!(report.documents_failed, 1);
    assert_eq!(report.documents_skipped, 1);
    assert_eq!(h.store.count(EntityLabel::Hook).await.unwrap(), 1);
}

#[tokio::test]
async fn test_rebuild_clears_previous_graph() {
    let h = harness(default_extractor());
    h.engine.ingest(&documents()).await;
    assert_eq!(h.store.count(EntityLabel::Prop).await.unwrap(), 2);

    let only_viewport = vec![ParsedDocument {
        url: "https://reactflow.dev/api-reference/hooks/use-viewport".to_string(),
        content: VIEWPORT_PAGE.to_string(),
    }];
    h.engine.rebuild(&only_viewport).await.unwrap();

    assert_eq!(h.store.count(EntityLabel::Component).await.unwrap(), 0);
    assert_eq!(h.store.count(EntityLabel::Prop).await.unwrap(), 0);
    assert_eq!(h.store.count(EntityLabel::Hook).await.unwrap(), 1);
}

#[tokio::test]
async fn test_prop_type_signature_pulls_in_related_types() {
    let page = "### ReactFlow nodes";
    let data = ExtractedData {
        components: Some(vec![Component {
            name: "ReactFlow".to_string(),
            description: "Renders the flow.".to_string(),
            props: Some(vec![prop(
                "nodes",
                "Node<CustomData>[]",
                "An array of node objects to render.",
            )]),
        }]),
        types: Some(vec![
            TypeDefinition {
                name: "Node".to_string(),
                description: "A node in the graph.".to_string(),
            },
            TypeDefinition {
                name: "Edge".to_string(),
                description: "A connection between two nodes.".to_string(),
            },
        ]),
        ..Default::default()
    };
    let h = harness(common::CannedExtractor::default().with(page, data));
    h.engine
        .rebuild(&[ParsedDocument {
            url: "https://reactflow.dev/api-reference/react-flow".to_string(),
            content: page.to_string(),
        }])
        .await
        .unwrap();

    let bundle = h.engine.retrieve("Which node objects can I pass?").await.unwrap();
    assert_eq!(bundle.entries.len(), 4);
    assert!(bundle.type_names.contains("Node"));
    assert!(bundle.type_names.contains("CustomData"));
    assert_eq!(
        bundle.related_types,
        vec![("Node".to_string(), "A node in the graph.".to_string())]
    );

    let context = bundle.to_string();
    assert!(context.ends_with("\nRelated Type Definitions:\n- Node: A node in the graph.\n"));
    assert_eq!(context.matches("Found Entity:").count(), 4);
}
