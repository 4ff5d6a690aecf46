//! OpenAiCompletionClient - Direct REST API implementation for OpenAI chat completions.
//!
//! The model is chosen per request; the API key comes from the caller or `OPENAI_API_KEY`.

use async_trait::async_trait;
use notechat_core::completion::{CompletionClient, CompletionMessage, CompletionRequest};
use notechat_core::conversation::MessageRole;
use notechat_core::error::{NotechatError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;

const BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Completion client that talks to the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAiCompletionClient {
    client: Client,
    api_key: String,
    max_tokens: Option<u32>,
}

impl OpenAiCompletionClient {
    /// Creates a new client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            max_tokens: None,
        }
    }

    /// Loads the API key from `OPENAI_API_KEY`.
    pub fn try_from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| NotechatError::config("OPENAI_API_KEY not found in environment variables"))?;
        Ok(Self::new(api_key))
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn build_request(&self, request: CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model,
            messages: request
                .messages
                .into_iter()
                .map(|message| ChatMessage {
                    role: message.role.as_str().to_string(),
                    content: message.content,
                })
                .collect(),
            max_tokens: self.max_tokens,
        }
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(BASE_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| NotechatError::completion(format!("OpenAI API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            NotechatError::completion(format!("Failed to parse OpenAI response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionMessage> {
        let body = self.build_request(request);
        tracing::debug!(
            "[OpenAiCompletionClient] Sending {} messages to {}",
            body.messages.len(),
            body.model
        );

        let text = self.send_request(&body).await?;
        Ok(CompletionMessage::new(MessageRole::Assistant, text))
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| NotechatError::completion("OpenAI API returned no content in the response"))
}

fn map_http_error(status: StatusCode, body: String) -> NotechatError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    NotechatError::completion(format!("OpenAI API returned {}: {}", status.as_u16(), message))
}
