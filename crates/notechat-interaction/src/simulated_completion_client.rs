//! Offline completion client returning a canned analysis after a delay.

use async_trait::async_trait;
use notechat_core::completion::{CompletionClient, CompletionMessage, CompletionRequest};
use notechat_core::conversation::MessageRole;
use notechat_core::error::Result;
use std::time::Duration;

pub const SIMULATED_REPLY: &str = "Based on my analysis, this code is implementing a React component with state management using hooks. It's rendering a UI with conditional logic based on the current state. The component follows React best practices for state updates and side effects.";

#[derive(Debug, Clone)]
pub struct SimulatedCompletionClient {
    delay: Duration,
    reply: String,
}

impl SimulatedCompletionClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            reply: SIMULATED_REPLY.to_string(),
        }
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = reply.into();
        self
    }
}

impl Default for SimulatedCompletionClient {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[async_trait]
impl CompletionClient for SimulatedCompletionClient {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionMessage> {
        tracing::debug!(
            "[SimulatedCompletionClient] Replying to {} messages after {:?}",
            request.messages.len(),
            self.delay
        );
        tokio::time::sleep(self.delay).await;
        Ok(CompletionMessage::new(MessageRole::Assistant, self.reply.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_replies_after_delay() {
        let client = SimulatedCompletionClient::default();
        let started = tokio::time::Instant::now();

        let reply = client
            .complete(CompletionRequest {
                model: "gpt-4o".to_string(),
                messages: vec![CompletionMessage::new(MessageRole::User, "Explain")],
            })
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.content, SIMULATED_REPLY);
    }

    #[tokio::test]
    async fn test_custom_reply() {
        let client = SimulatedCompletionClient::new(Duration::ZERO).with_reply("ok");
        let reply = client
            .complete(CompletionRequest {
                model: String::new(),
                messages: Vec::new(),
            })
            .await
            .unwrap();
        assert_eq!(reply.content, "ok");
    }
}
