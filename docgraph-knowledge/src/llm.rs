//! OpenAI-compatible chat-completions client.
//!
//! Shared by the extraction model (JSON mode) and the answer synthesizer.

use docgraph_core::LlmSettings;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{KnowledgeError, KnowledgeResult};

#[derive(Debug, Clone)]
pub struct ChatClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

/// Request body for the Chat Completions API
#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatClient {
    pub fn new(settings: &LlmSettings, api_key: Option<String>) -> KnowledgeResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", api_key)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    /// Single-turn completion: one system prompt, one user message.
    ///
    /// With `json_mode` the endpoint is asked for a JSON object response.
    pub async fn complete(&self, system: &str, user: &str, json_mode: bool) -> KnowledgeResult<String> {
        let request = ChatCompletionsRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(system.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(user.to_string()),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: json_mode.then_some(ResponseFormat {
                r#type: "json_object",
            }),
        };

        let response = self
            .http_client
            .post(self.chat_completions_url())
            .headers(self.auth_headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::Llm(format!(
                "chat completion failed: {status} {text}"
            )));
        }

        let payload: ChatCompletionsResponse = response.json().await?;
        parse_completion(payload)
    }
}

fn parse_completion(payload: ChatCompletionsResponse) -> KnowledgeResult<String> {
    if let Some(usage) = &payload.usage {
        debug!(
            model = %payload.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "chat completion"
        );
    }

    let choice = payload
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| KnowledgeError::Llm("no choices in response".to_string()))?;

    if choice.finish_reason.as_deref() == Some("length") {
        return Err(KnowledgeError::Llm(
            "completion truncated by max_tokens".to_string(),
        ));
    }

    choice
        .message
        .content
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| KnowledgeError::Llm("no content in response".to_string()))
}
