//! Answer generation from an assembled context bundle.

use async_trait::async_trait;

use crate::errors::KnowledgeResult;
use crate::llm::ChatClient;

/// Context + question in, natural-language answer out.
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn generate(&self, context: &str, question: &str) -> KnowledgeResult<String>;
}

/// Shown when retrieval finds nothing to answer from.
pub const NO_CONTEXT_MESSAGE: &str =
    "I'm sorry, I couldn't find any relevant information in the documentation to answer your question.";

const ANSWER_PROMPT: &str = "You are an expert on the React Flow library. Use the provided, richly detailed context from the knowledge graph to answer the user's question. The context may include components, props, hooks, and related type definitions. Synthesize this information into a clear, helpful answer.";

/// Outcome of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Retrieval produced no context; the model was not consulted.
    NoContext,
    Answered { context: String, answer: String },
}

impl Answer {
    /// Text to show the user.
    pub fn text(&self) -> &str {
        match self {
            Self::NoContext => NO_CONTEXT_MESSAGE,
            Self::Answered { answer, .. } => answer,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmSynthesizer {
    client: ChatClient,
}

impl LlmSynthesizer {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

pub(crate) fn answer_user_message(context: &str, question: &str) -> String {
    format!("CONTEXT FROM DATABASE:\n{context}\n\nQUESTION:\n{question}")
}

#[async_trait]
impl AnswerSynthesizer for LlmSynthesizer {
    async fn generate(&self, context: &str, question: &str) -> KnowledgeResult<String> {
        self.client
            .complete(ANSWER_PROMPT, &answer_user_message(context, question), false)
            .await
    }
}
