//! Chat completion collaborator.
//!
//! The completion API is opaque to the core: given an ordered list of
//! role-tagged messages and a model identifier it returns one
//! role-tagged message, or fails.

use crate::conversation::MessageRole;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One role-tagged message sent to or received from a completion API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: MessageRole,
    pub content: String,
}

impl CompletionMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A completion request: the model to use and the conversation so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
}

/// A blocking request/response chat completion backend.
///
/// Calls are awaited without timeout or retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Human-readable backend name used in logs.
    fn name(&self) -> &str;

    /// Returns the assistant reply for `request`.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionMessage>;
}
